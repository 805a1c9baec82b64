// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 串联各阶段的下载流水线和宿主界面接口
pub mod application;

/// 配置模块
///
/// 处理门户地址、超时、并发等配置和环境变量
pub mod config;

/// 领域模块
///
/// 包含区域、产品类型、下载任务与批次等核心实体
pub mod domain;

/// 基础设施模块
///
/// 归档解压等文件系统实现
pub mod infrastructure;

/// 门户模块
///
/// 会话、目录、验证码、登录与链接解析
pub mod portal;

/// 工具模块
///
/// 错误类型和遥测初始化
pub mod utils;

/// 工作器模块
///
/// 有界并发的文件下载
pub mod workers;
