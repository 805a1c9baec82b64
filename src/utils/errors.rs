// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;
use thiserror::Error;

/// 流水线阶段
///
/// 用于在错误和日志中标识失败发生在哪一步
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// 会话预热
    Prime,
    /// 区域目录
    Catalog,
    /// 验证码
    Captcha,
    /// 登录
    Login,
    /// 链接解析
    Resolve,
    /// 文件下载
    Download,
    /// 解压加载
    Extract,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Prime => "prime",
            Stage::Catalog => "catalog",
            Stage::Captcha => "captcha",
            Stage::Login => "login",
            Stage::Resolve => "resolve",
            Stage::Download => "download",
            Stage::Extract => "extract",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 阶段级错误
///
/// 任何一个阶段返回此错误时，流水线在该阶段停止，但已完成的工作保持不变
#[derive(Error, Debug)]
pub enum PortalError {
    /// 传输层失败（超时、连接被拒绝等），重试该阶段即可恢复
    #[error("connection failed during {stage}: {source}")]
    Connection {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    /// 服务返回非 2xx 状态或无法解析的内容
    #[error("service error during {stage}: {reason}")]
    Service { stage: Stage, reason: String },

    /// 凭据或验证码被服务明确拒绝
    #[error("login rejected: invalid credentials or captcha")]
    AuthRejected,

    /// 缺少必需的用户输入，未发出任何网络请求
    #[error("missing or invalid input: {0}")]
    InputValidation(String),
}

impl PortalError {
    pub fn connection(stage: Stage, source: reqwest::Error) -> Self {
        PortalError::Connection { stage, source }
    }

    pub fn service(stage: Stage, reason: impl Into<String>) -> Self {
        PortalError::Service {
            stage,
            reason: reason.into(),
        }
    }

    /// 返回出错的阶段（输入校验错误没有对应阶段）
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PortalError::Connection { stage, .. } | PortalError::Service { stage, .. } => {
                Some(*stage)
            }
            PortalError::AuthRejected => Some(Stage::Login),
            PortalError::InputValidation(_) => None,
        }
    }

    /// 判断错误是否可以通过重新触发该阶段来恢复
    ///
    /// # 返回值
    ///
    /// 连接错误返回true，其余返回false
    pub fn is_retryable(&self) -> bool {
        matches!(self, PortalError::Connection { .. })
    }

    /// 面向用户的简短状态信息，不包含底层错误细节
    pub fn status_message(&self) -> String {
        match self {
            PortalError::Connection { stage, .. } => match stage {
                Stage::Prime => "Initial connection error.".to_string(),
                Stage::Catalog => "Could not load the list of areas.".to_string(),
                Stage::Captcha => "Connection error while loading the CAPTCHA.".to_string(),
                Stage::Login => "Connection error during login.".to_string(),
                Stage::Resolve => "Could not retrieve the list of files.".to_string(),
                other => format!("Connection error during {other}."),
            },
            PortalError::Service { stage, .. } => match stage {
                Stage::Catalog => "Could not load the list of areas.".to_string(),
                Stage::Captcha => "The CAPTCHA is unavailable.".to_string(),
                Stage::Resolve => "No files available.".to_string(),
                other => format!("The portal returned an error during {other}."),
            },
            PortalError::AuthRejected => "Login failed.".to_string(),
            PortalError::InputValidation(reason) => format!("Error: {reason}"),
        }
    }
}

/// 单个下载任务的失败原因
///
/// 只记录在批次结果中，不会升级为批次级失败
#[derive(Error, Debug)]
pub enum JobError {
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("transfer failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cancelled before start")]
    Cancelled,

    #[error("download task aborted: {0}")]
    Aborted(String),
}

/// 单个归档的解压失败原因
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("unsafe archive entry: {0}")]
    UnsafeEntry(String),
}
