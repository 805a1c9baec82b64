// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模块
///
/// 包含区域目录、产品类型、凭据、下载任务与批次、图层等核心实体
pub mod models;
