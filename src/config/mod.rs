// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理门户地址、超时、下载并发和解压规则等配置
pub mod settings;
