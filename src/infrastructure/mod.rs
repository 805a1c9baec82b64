// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施模块
///
/// 文件系统相关的实现，目前是归档解压与栅格定位
pub mod archive_loader;
