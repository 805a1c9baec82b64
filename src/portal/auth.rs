// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::credentials::Credentials;
use crate::portal::session::{PortalSession, LOGIN_PATH};
use crate::utils::errors::{PortalError, Stage};
use tracing::{debug, info, warn};

/// 登录成功时服务返回的唯一正文
const LOGIN_OK: &str = "ok";

/// 判断登录响应是否表示成功
///
/// 只有状态码为 200 且去除首尾空白后的正文恰好是 `ok` 才算成功
pub fn is_login_success(status: u16, body: &str) -> bool {
    status == 200 && body.trim() == LOGIN_OK
}

/// 提交凭据和验证码
///
/// 三个输入必须都非空，否则在本地拒绝且不发出请求。失败后调用方应
/// 重新获取验证码，因为验证码通常只能使用一次
///
/// # 返回值
///
/// * `Ok(())` - 登录成功，会话 cookie 已被认证
/// * `Err(PortalError::AuthRejected)` - 服务拒绝了凭据或验证码
/// * `Err(PortalError::Connection)` - 连接层失败
/// * `Err(PortalError::InputValidation)` - 输入不完整
pub async fn login(session: &PortalSession, credentials: &Credentials) -> Result<(), PortalError> {
    credentials.ensure_complete()?;

    let form = [
        ("tela", "login"),
        ("usuario", credentials.identity.as_str()),
        ("senha", credentials.secret.as_str()),
        ("captcha", credentials.captcha.as_str()),
    ];

    debug!("Submitting login");
    let response = session
        .client()
        .post(session.endpoint(LOGIN_PATH))
        .headers(session.ajax_headers())
        .form(&form)
        .timeout(session.timeouts().login())
        .send()
        .await
        .map_err(|e| PortalError::connection(Stage::Login, e))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| PortalError::connection(Stage::Login, e))?;

    if is_login_success(status, &body) {
        info!("Login accepted");
        Ok(())
    } else {
        warn!("Login rejected (status {})", status);
        Err(PortalError::AuthRejected)
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
