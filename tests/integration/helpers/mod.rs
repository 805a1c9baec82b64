// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod portal;
pub mod recording_host;

pub use portal::{mount_portal, zip_bytes};
pub use recording_host::RecordingHost;
