// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::settings::{Settings, TimeoutSettings};
use crate::utils::errors::{PortalError, Stage};
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER};
use tracing::{debug, info, warn};
use url::Url;

/// 地图页面，仅用作 Referer
pub const MAP_PAGE_PATH: &str = "mapa.php";
/// 登录接口
pub const LOGIN_PATH: &str = "login.php";
/// 链接解析接口
pub const DOWNLOAD_PATH: &str = "baixararquivo.php";
/// 验证码接口
pub const CAPTCHA_PATH: &str = "get_captcha.php";
/// 区域目录文档
pub const CATALOG_PATH: &str = "estados_pe.json";

/// 门户会话
///
/// 持有带 cookie 存储的HTTP客户端。每次用户发起的运行对应一个会话，
/// 由流水线独占，并以引用方式传递给各个阶段。下载任务只读取其中的
/// cookie，不修改会话状态
#[derive(Debug, Clone)]
pub struct PortalSession {
    client: reqwest::Client,
    base_url: Url,
    timeouts: TimeoutSettings,
}

impl PortalSession {
    /// 根据配置创建会话
    ///
    /// # 参数
    ///
    /// * `settings` - 应用配置
    ///
    /// # 返回值
    ///
    /// * `Ok(PortalSession)` - 新会话（尚未预热）
    /// * `Err(PortalError)` - 门户地址无效或客户端无法构建
    pub fn new(settings: &Settings) -> Result<Self, PortalError> {
        let mut raw = settings.portal.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw).map_err(|e| {
            PortalError::InputValidation(format!("invalid portal url '{raw}': {e}"))
        })?;

        let mut builder = reqwest::Client::builder()
            .user_agent(settings.portal.user_agent.clone())
            .cookie_store(true);

        // The portal's certificate chain does not validate on most hosts.
        if settings.portal.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|e| {
            PortalError::service(Stage::Prime, format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            base_url,
            timeouts: settings.timeouts.clone(),
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeouts(&self) -> &TimeoutSettings {
        &self.timeouts
    }

    /// 拼接门户上的接口地址
    pub fn endpoint(&self, path: &str) -> Url {
        // Joining a relative path onto a base ending in '/' cannot fail.
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }

    /// 不带结尾斜杠的源地址，用于 Origin 头
    pub fn origin(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_string()
    }

    /// 将链接解析得到的地址转换为绝对地址
    ///
    /// 绝对地址原样返回，相对地址拼接到门户根地址上
    pub fn absolute_url(&self, href: &str) -> String {
        match Url::parse(href) {
            Ok(url) => url.to_string(),
            Err(_) => self
                .base_url
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string()),
        }
    }

    /// 有状态请求所需的请求头（Referer、Origin、Ajax 标记）
    pub fn ajax_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(referer) = HeaderValue::from_str(self.endpoint(MAP_PAGE_PATH).as_str()) {
            headers.insert(REFERER, referer);
        }
        if let Ok(origin) = HeaderValue::from_str(&self.origin()) {
            headers.insert(ORIGIN, origin);
        }
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        headers
    }

    /// 预热会话
    ///
    /// 向服务根地址发出一次 GET，让服务在有状态调用前下发会话 cookie。
    /// 失败不致命：调用方记录后继续，后续阶段会报告各自的错误
    pub async fn prime(&self) -> Result<(), PortalError> {
        debug!("Priming session against {}", self.base_url);
        let response = self
            .client
            .get(self.base_url.clone())
            .timeout(self.timeouts.prime())
            .send()
            .await
            .map_err(|e| PortalError::connection(Stage::Prime, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Session priming returned status {}", status);
            return Err(PortalError::service(
                Stage::Prime,
                format!("unexpected status {status}"),
            ));
        }

        info!("Session primed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
