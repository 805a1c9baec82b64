// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供并发下载：单任务获取器与有界的批次协调器
pub mod coordinator;
pub mod fetcher;

pub use coordinator::{BatchObserver, DownloadCoordinator};
pub use fetcher::{FileFetcher, HttpFileFetcher};
