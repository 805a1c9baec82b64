// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 门户模块
///
/// 会话管理、区域目录、验证码、登录与链接解析。每个阶段都以引用方式
/// 接收同一个 `PortalSession`
pub mod auth;
pub mod captcha;
pub mod catalog;
pub mod links;
pub mod session;

pub use session::PortalSession;
