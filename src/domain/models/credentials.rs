// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::PortalError;
use std::fmt;
use validator::Validate;

/// 一次登录尝试的输入
///
/// 仅在单次认证中使用，从不持久化
#[derive(Clone, Validate)]
pub struct Credentials {
    /// 用户邮箱
    #[validate(length(min = 1, message = "e-mail is required"))]
    pub identity: String,
    /// 密码
    #[validate(length(min = 1, message = "password is required"))]
    pub secret: String,
    /// 用户识别出的验证码文本
    #[validate(length(min = 1, message = "captcha is required"))]
    pub captcha: String,
}

impl Credentials {
    pub fn new(
        identity: impl Into<String>,
        secret: impl Into<String>,
        captcha: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
            captcha: captcha.into(),
        }
    }

    /// 检查三个字段均非空，失败时不发出任何网络请求
    pub fn ensure_complete(&self) -> Result<(), PortalError> {
        self.validate().map_err(|errors| {
            let mut fields: Vec<String> = errors
                .field_errors()
                .keys()
                .map(|field| field.to_string())
                .collect();
            fields.sort_unstable();
            PortalError::InputValidation(format!("fill in all fields ({})", fields.join(", ")))
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"***")
            .field("captcha", &"***")
            .finish()
    }
}
