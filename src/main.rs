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

use async_trait::async_trait;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};
use pe3d_downloader::application::{DownloadPipeline, DownloadRequest, HostSurface, RunStatus};
use pe3d_downloader::config::settings::Settings;
use pe3d_downloader::domain::models::area::AreaCatalog;
use pe3d_downloader::domain::models::credentials::Credentials;
use pe3d_downloader::domain::models::layer::ExtractedLayer;
use pe3d_downloader::domain::models::product::ProductType;
use pe3d_downloader::portal::captcha::CaptchaImage;
use pe3d_downloader::utils::errors::PortalError;
use pe3d_downloader::utils::telemetry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// 终端交互
///
/// 空输入、输入结束或终端不可用时返回 `None`
#[async_trait]
trait Prompter: Send + Sync {
    async fn text(&self, label: &str, initial: Option<String>) -> Option<String>;

    /// 输入时不回显
    async fn secret(&self, label: &str) -> Option<String>;

    async fn confirm(&self, label: &str, default: bool) -> bool;

    async fn select(&self, label: &str, items: Vec<String>) -> Option<usize>;
}

/// 基于 dialoguer 的终端交互，阻塞读取放在 `spawn_blocking` 中
struct DialoguerPrompter;

async fn interact<T, F>(f: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> dialoguer::Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            warn!("Prompt failed: {}", e);
            None
        }
        Err(e) => {
            warn!("Prompt task failed: {}", e);
            None
        }
    }
}

fn non_empty(answer: String) -> Option<String> {
    let trimmed = answer.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[async_trait]
impl Prompter for DialoguerPrompter {
    async fn text(&self, label: &str, initial: Option<String>) -> Option<String> {
        let label = label.to_string();
        let answer = interact(move || {
            let theme = ColorfulTheme::default();
            let mut input = Input::<String>::with_theme(&theme)
                .with_prompt(label)
                .allow_empty(true);
            if let Some(initial) = initial {
                input = input.with_initial_text(initial);
            }
            input.interact_text()
        })
        .await?;
        non_empty(answer)
    }

    async fn secret(&self, label: &str) -> Option<String> {
        let label = label.to_string();
        let answer = interact(move || {
            Password::with_theme(&ColorfulTheme::default())
                .with_prompt(label)
                .allow_empty_password(true)
                .interact()
        })
        .await?;
        non_empty(answer)
    }

    async fn confirm(&self, label: &str, default: bool) -> bool {
        let label = label.to_string();
        interact(move || {
            Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(label)
                .default(default)
                .interact()
        })
        .await
        .unwrap_or(false)
    }

    async fn select(&self, label: &str, items: Vec<String>) -> Option<usize> {
        let label = label.to_string();
        interact(move || {
            Select::with_theme(&ColorfulTheme::default())
                .with_prompt(label)
                .items(&items)
                .default(0)
                .interact()
        })
        .await
    }
}

/// 终端宿主
///
/// 状态输出到标准输出，验证码保存为当前目录下的图片文件
struct TerminalHost {
    captcha_stem: PathBuf,
    prompter: Arc<dyn Prompter>,
}

impl TerminalHost {
    fn new(captcha_stem: PathBuf, prompter: Arc<dyn Prompter>) -> Self {
        Self {
            captcha_stem,
            prompter,
        }
    }
}

#[async_trait]
impl HostSurface for TerminalHost {
    fn show_status(&self, message: &str) {
        println!("{message}");
    }

    fn show_progress(&self, percent: u8) {
        println!("Progress: {percent}%");
    }

    fn show_captcha(&self, image: &CaptchaImage) {
        let path = self.captcha_stem.with_extension(image.extension());
        match std::fs::write(&path, &image.bytes) {
            Ok(()) => println!("CAPTCHA saved to {} - open it to read the code.", path.display()),
            Err(e) => warn!("Could not save captcha to {}: {}", path.display(), e),
        }
    }

    fn register_layer(&self, layer: &ExtractedLayer) {
        println!("Layer '{}': {}", layer.name, layer.raster.display());
    }

    async fn choose_destination(&self) -> Option<PathBuf> {
        self.prompter
            .text("Destination directory (empty to cancel)", None)
            .await
            .map(PathBuf::from)
    }

    async fn confirm_load(&self, downloaded: usize) -> bool {
        self.prompter
            .confirm(
                &format!("{downloaded} file(s) downloaded. Extract and load the layers?"),
                true,
            )
            .await
    }
}

/// 名称中包含输入文本的区域，最多十个
fn suggest_areas<'a>(catalog: &'a AreaCatalog, answer: &str) -> Vec<&'a str> {
    let needle = answer.trim().to_lowercase();
    catalog
        .names()
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&needle))
        .take(10)
        .collect()
}

async fn prompt_area(prompter: &dyn Prompter, catalog: &AreaCatalog) -> Option<String> {
    println!("{} areas available.", catalog.len());
    loop {
        let answer = prompter.text("Area", None).await?;
        if let Some(area) = catalog.get(&answer) {
            return Some(area.name.clone());
        }
        let suggestions = suggest_areas(catalog, &answer);
        if suggestions.is_empty() {
            println!("Unknown area '{answer}'.");
        } else {
            println!("Did you mean: {}", suggestions.join(", "));
        }
    }
}

async fn prompt_product(prompter: &dyn Prompter) -> Option<ProductType> {
    let labels = ProductType::ALL
        .iter()
        .map(|product| product.label().to_string())
        .collect();
    let index = prompter.select("Product type", labels).await?;
    ProductType::ALL.get(index).copied()
}

/// 读取邮箱和密码
///
/// 登录被拒绝后邮箱以上一次的值预填，密码总是重新输入
async fn read_credentials(
    prompter: &dyn Prompter,
    rejected: Option<&Credentials>,
) -> Option<(String, String)> {
    let identity = prompter
        .text("E-mail", rejected.map(|c| c.identity.clone()))
        .await?;
    let secret = prompter.secret("Password").await?;
    Some((identity, secret))
}

#[derive(Debug, PartialEq, Eq)]
enum CaptchaAnswer {
    Reload,
    Code(String),
}

async fn read_captcha(prompter: &dyn Prompter) -> Option<CaptchaAnswer> {
    let answer = prompter.text("CAPTCHA (r to reload)", None).await?;
    if answer.eq_ignore_ascii_case("r") {
        Some(CaptchaAnswer::Reload)
    } else {
        Some(CaptchaAnswer::Code(answer))
    }
}

/// 主函数
///
/// 在终端中完成登录、选择和下载
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_telemetry();
    info!("Starting pe3d-downloader...");

    let settings = Settings::new()?;
    info!("Configuration loaded, portal at {}", settings.portal.base_url);

    let prompter: Arc<dyn Prompter> = Arc::new(DialoguerPrompter);
    let host = Arc::new(TerminalHost::new(PathBuf::from("captcha"), prompter.clone()));
    let mut pipeline = DownloadPipeline::new(settings, host)?;

    if let Err(e) = pipeline.open().await {
        warn!("Pipeline opened with errors: {}", e);
    }
    while pipeline.catalog().is_none() {
        if !prompter.confirm("Retry loading the list of areas?", true).await {
            return Ok(());
        }
        let _ = pipeline.reload_catalog().await;
    }

    let area = match pipeline.catalog() {
        Some(catalog) => prompt_area(prompter.as_ref(), catalog).await,
        None => None,
    };
    let Some(area) = area else {
        return Ok(());
    };
    let Some(product) = prompt_product(prompter.as_ref()).await else {
        return Ok(());
    };

    let mut rejected: Option<Credentials> = None;
    loop {
        let Some((identity, secret)) = read_credentials(prompter.as_ref(), rejected.as_ref()).await
        else {
            return Ok(());
        };
        let captcha = loop {
            match read_captcha(prompter.as_ref()).await {
                Some(CaptchaAnswer::Code(code)) => break code,
                Some(CaptchaAnswer::Reload) => {
                    let _ = pipeline.reload_captcha().await;
                }
                None => return Ok(()),
            }
        };

        let request = DownloadRequest {
            area: area.clone(),
            product,
            credentials: Credentials::new(identity, secret, captcha),
        };

        let result = tokio::select! {
            result = pipeline.run(&request) => result,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, waiting for in-flight downloads");
                pipeline.shutdown().await;
                return Ok(());
            }
        };

        match result {
            Ok(report) => {
                if report.status == RunStatus::Completed {
                    println!(
                        "{} of {} file(s) downloaded, {} failed, {} layer(s) from {} archive(s).",
                        report.downloaded.len(),
                        report.resolved,
                        report.failed,
                        report.layers.len(),
                        report.archives_attempted
                    );
                }
                break;
            }
            // A fresh captcha has already been shown.
            Err(PortalError::AuthRejected) => rejected = Some(request.credentials),
            Err(e) => {
                pipeline.shutdown().await;
                return Err(e.into());
            }
        }
    }

    pipeline.shutdown().await;
    Ok(())
}
