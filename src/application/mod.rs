// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用模块
///
/// 宿主界面接口与串联各阶段的下载流水线
pub mod host;
pub mod pipeline;

pub use host::HostSurface;
pub use pipeline::{DownloadPipeline, DownloadRequest, RunReport, RunStatus};
