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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://pe3d.pe.gov.br/";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// 应用程序配置设置
///
/// 包含门户地址、各阶段超时、下载并发和解压规则
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 门户配置
    pub portal: PortalSettings,
    /// 超时配置
    pub timeouts: TimeoutSettings,
    /// 下载配置
    pub download: DownloadSettings,
    /// 解压配置
    pub extraction: ExtractionSettings,
}

/// 门户配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct PortalSettings {
    /// 服务根地址（以 `/` 结尾）
    pub base_url: String,
    /// 每个请求携带的 User-Agent
    pub user_agent: String,
    /// 是否接受无效的TLS证书
    pub accept_invalid_certs: bool,
}

/// 超时配置设置（秒）
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutSettings {
    pub prime: u64,
    pub catalog: u64,
    pub captcha: u64,
    pub login: u64,
    pub resolve: u64,
    /// 单个文件下载的超时，大型栅格文件可能很慢
    pub download: u64,
}

impl TimeoutSettings {
    pub fn prime(&self) -> Duration {
        Duration::from_secs(self.prime)
    }

    pub fn catalog(&self) -> Duration {
        Duration::from_secs(self.catalog)
    }

    pub fn captcha(&self) -> Duration {
        Duration::from_secs(self.captcha)
    }

    pub fn login(&self) -> Duration {
        Duration::from_secs(self.login)
    }

    pub fn resolve(&self) -> Duration {
        Duration::from_secs(self.resolve)
    }

    pub fn download(&self) -> Duration {
        Duration::from_secs(self.download)
    }
}

/// 下载配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadSettings {
    /// 同时进行的下载任务上限
    pub concurrency: usize,
    /// 写入缓冲区大小（字节）
    pub chunk_size: usize,
    /// 目标目录，未设置时由宿主交互选择
    pub output_dir: Option<PathBuf>,
}

/// 解压配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionSettings {
    /// 识别为栅格的扩展名（不区分大小写）
    pub raster_extensions: Vec<String>,
    /// 下载完成后是否不经确认直接加载
    pub auto_load: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            portal: PortalSettings {
                base_url: DEFAULT_BASE_URL.to_string(),
                user_agent: DEFAULT_USER_AGENT.to_string(),
                accept_invalid_certs: true,
            },
            timeouts: TimeoutSettings {
                prime: 15,
                catalog: 30,
                captcha: 15,
                login: 15,
                resolve: 30,
                download: 300,
            },
            download: DownloadSettings {
                concurrency: 4,
                chunk_size: 8192,
                output_dir: None,
            },
            extraction: ExtractionSettings {
                raster_extensions: vec![".tif".to_string(), ".tiff".to_string()],
                auto_load: false,
            },
        }
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、`config/default.toml`、`config/<APP_ENVIRONMENT>.toml`
    /// 和 `PE3D__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Portal
            .set_default("portal.base_url", DEFAULT_BASE_URL)?
            .set_default("portal.user_agent", DEFAULT_USER_AGENT)?
            .set_default("portal.accept_invalid_certs", true)?
            // Per-stage timeouts
            .set_default("timeouts.prime", 15)?
            .set_default("timeouts.catalog", 30)?
            .set_default("timeouts.captcha", 15)?
            .set_default("timeouts.login", 15)?
            .set_default("timeouts.resolve", 30)?
            .set_default("timeouts.download", 300)?
            // Download pool
            .set_default("download.concurrency", 4)?
            .set_default("download.chunk_size", 8192)?
            // Extraction
            .set_default("extraction.raster_extensions", vec![".tif", ".tiff"])?
            .set_default("extraction.auto_load", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("PE3D").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 使用默认值并指向给定的门户地址
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut settings = Self::default();
        settings.portal.base_url = base_url.into();
        settings
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.download.concurrency == 0 {
            return Err(ConfigError::Message(
                "download.concurrency must be at least 1".to_string(),
            ));
        }
        if self.download.chunk_size == 0 {
            return Err(ConfigError::Message(
                "download.chunk_size must be at least 1".to_string(),
            ));
        }
        url::Url::parse(&self.portal.base_url)
            .map_err(|e| ConfigError::Message(format!("portal.base_url is invalid: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
