// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::portal::session::{PortalSession, CAPTCHA_PATH};
use crate::utils::errors::{PortalError, Stage};
use bytes::Bytes;
use tracing::debug;

/// 验证码图片
///
/// 内容对客户端不透明，只交给用户识别
#[derive(Debug, Clone)]
pub struct CaptchaImage {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

impl CaptchaImage {
    /// 根据内容类型推断的文件扩展名
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_deref() {
            Some(ct) if ct.contains("jpeg") || ct.contains("jpg") => "jpg",
            Some(ct) if ct.contains("gif") => "gif",
            _ => "png",
        }
    }
}

/// 获取与当前会话绑定的验证码
///
/// 每次调用都会使该会话之前下发的验证码失效，调用方必须始终使用最新的一张
pub async fn fetch_challenge(session: &PortalSession) -> Result<CaptchaImage, PortalError> {
    debug!("Requesting new captcha challenge");
    let response = session
        .client()
        .get(session.endpoint(CAPTCHA_PATH))
        .timeout(session.timeouts().captcha())
        .send()
        .await
        .map_err(|e| PortalError::connection(Stage::Captcha, e))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(PortalError::service(
            Stage::Captcha,
            format!("unexpected status {status}"),
        ));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .bytes()
        .await
        .map_err(|e| PortalError::connection(Stage::Captcha, e))?;

    if bytes.is_empty() {
        return Err(PortalError::service(Stage::Captcha, "empty captcha image"));
    }

    Ok(CaptchaImage {
        bytes,
        content_type,
    })
}
