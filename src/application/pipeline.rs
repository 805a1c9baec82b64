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

use crate::application::host::{HostProgressObserver, HostSurface};
use crate::config::settings::Settings;
use crate::domain::models::area::AreaCatalog;
use crate::domain::models::credentials::Credentials;
use crate::domain::models::download::DownloadJob;
use crate::domain::models::layer::{ExtractedLayer, LoadReport};
use crate::domain::models::product::ProductType;
use crate::infrastructure::archive_loader::ArchiveLoader;
use crate::portal::captcha::{self, CaptchaImage};
use crate::portal::session::PortalSession;
use crate::portal::{auth, catalog, links};
use crate::utils::errors::PortalError;
use crate::workers::coordinator::DownloadCoordinator;
use crate::workers::fetcher::{FileFetcher, HttpFileFetcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 用户发起的一次下载请求
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// 区域显示名称
    pub area: String,
    /// 产品类型
    pub product: ProductType,
    /// 登录凭据
    pub credentials: Credentials,
}

/// 运行结束的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// 门户没有返回任何文件
    NoFiles,
    /// 用户没有选择目标目录
    Cancelled,
    /// 批次已结束（可能包含失败的任务）
    Completed,
}

/// 一次运行的汇总
#[derive(Debug)]
pub struct RunReport {
    pub status: RunStatus,
    /// 解析出的文件数
    pub resolved: usize,
    /// 成功下载的文件
    pub downloaded: Vec<PathBuf>,
    /// 下载失败的文件数
    pub failed: usize,
    /// 尝试解压的归档数
    pub archives_attempted: usize,
    /// 已登记的图层
    pub layers: Vec<ExtractedLayer>,
}

impl RunReport {
    fn empty(status: RunStatus, resolved: usize) -> Self {
        Self {
            status,
            resolved,
            downloaded: Vec::new(),
            failed: 0,
            archives_attempted: 0,
            layers: Vec::new(),
        }
    }
}

/// 下载流水线
///
/// 按顺序执行：会话预热 → 区域目录 → 验证码 → 登录 → 链接解析 →
/// 批量下载 → 解压加载。任一阶段失败时停止在该阶段，已完成的工作保留，
/// 失败以一条状态信息呈现给宿主
pub struct DownloadPipeline<H: HostSurface + ?Sized> {
    settings: Settings,
    session: PortalSession,
    host: Arc<H>,
    catalog: Option<AreaCatalog>,
    coordinator: Arc<DownloadCoordinator>,
    loader: ArchiveLoader,
}

impl<H: HostSurface + ?Sized> DownloadPipeline<H> {
    /// 创建流水线，下载使用会话的HTTP客户端
    pub fn new(settings: Settings, host: Arc<H>) -> Result<Self, PortalError> {
        let session = PortalSession::new(&settings)?;
        let fetcher = Arc::new(HttpFileFetcher::from_session(
            &session,
            settings.download.chunk_size,
        ));
        Ok(Self::with_fetcher(settings, session, host, fetcher))
    }

    /// 使用指定的获取器创建流水线
    pub fn with_fetcher(
        settings: Settings,
        session: PortalSession,
        host: Arc<H>,
        fetcher: Arc<dyn FileFetcher>,
    ) -> Self {
        let coordinator = Arc::new(DownloadCoordinator::new(
            fetcher,
            settings.download.concurrency,
        ));
        let loader = ArchiveLoader::new(settings.extraction.raster_extensions.clone());
        Self {
            settings,
            session,
            host,
            catalog: None,
            coordinator,
            loader,
        }
    }

    pub fn session(&self) -> &PortalSession {
        &self.session
    }

    pub fn catalog(&self) -> Option<&AreaCatalog> {
        self.catalog.as_ref()
    }

    /// 协调器句柄，可用于从其他任务关闭
    pub fn coordinator(&self) -> Arc<DownloadCoordinator> {
        self.coordinator.clone()
    }

    /// 打开流水线
    ///
    /// 预热失败只记录日志；目录和验证码都会尝试，返回遇到的第一个错误
    pub async fn open(&mut self) -> Result<(), PortalError> {
        if let Err(e) = self.session.prime().await {
            warn!("Session priming failed, continuing: {}", e);
            self.host.show_status(&e.status_message());
        }

        let catalog_result = self.reload_catalog().await.map(|_| ());
        let captcha_result = self.reload_captcha().await.map(|_| ());
        if let Err(e) = &catalog_result {
            // Keep the catalog failure visible after the captcha messages.
            self.host.show_status(&e.status_message());
        }

        catalog_result.and(captcha_result)?;
        self.host.show_status("Waiting for credentials.");
        Ok(())
    }

    /// 重新加载区域目录，失败时区域选择保持不可用
    pub async fn reload_catalog(&mut self) -> Result<&AreaCatalog, PortalError> {
        self.host.show_status("Loading the list of areas...");
        match catalog::fetch_areas(&self.session).await {
            Ok(areas) => Ok(self.catalog.insert(areas)),
            Err(e) => {
                error!("Area catalog unavailable: {}", e);
                self.catalog = None;
                self.host.show_status(&e.status_message());
                Err(e)
            }
        }
    }

    /// 获取并显示新的验证码
    pub async fn reload_captcha(&self) -> Result<CaptchaImage, PortalError> {
        self.host.show_status("Loading CAPTCHA...");
        let image = self.fetch_captcha().await?;
        self.host.show_status("CAPTCHA loaded.");
        Ok(image)
    }

    async fn fetch_captcha(&self) -> Result<CaptchaImage, PortalError> {
        match captcha::fetch_challenge(&self.session).await {
            Ok(image) => {
                self.host.show_captcha(&image);
                Ok(image)
            }
            Err(e) => {
                warn!("Captcha unavailable: {}", e);
                self.host.show_status(&e.status_message());
                Err(e)
            }
        }
    }

    /// 执行登录、解析、下载和加载
    ///
    /// # 返回值
    ///
    /// * `Ok(RunReport)` - 流水线到达终点（包括没有文件或用户取消）
    /// * `Err(PortalError)` - 某个阶段失败，状态信息已显示给宿主
    pub async fn run(&self, request: &DownloadRequest) -> Result<RunReport, PortalError> {
        match self.run_stages(request).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.host.show_status(&e.status_message());
                if matches!(e, PortalError::AuthRejected) {
                    // Challenges are single use; show a fresh one.
                    let _ = self.fetch_captcha().await;
                }
                Err(e)
            }
        }
    }

    async fn run_stages(&self, request: &DownloadRequest) -> Result<RunReport, PortalError> {
        request.credentials.ensure_complete()?;
        let area_name = self.selected_area(&request.area)?;

        self.host.show_status("Authenticating...");
        auth::login(&self.session, &request.credentials).await?;
        self.host.show_status("Login successful!");

        self.host
            .show_status(&format!("Fetching the list of files for '{area_name}'..."));
        let urls = links::resolve_links(&self.session, &area_name, request.product).await?;
        if urls.is_empty() {
            self.host.show_status("No files available.");
            return Ok(RunReport::empty(RunStatus::NoFiles, 0));
        }

        let destination = match self.destination().await {
            Some(dir) => dir,
            None => {
                self.host.show_status("Download cancelled.");
                return Ok(RunReport::empty(RunStatus::Cancelled, urls.len()));
            }
        };
        tokio::fs::create_dir_all(&destination).await.map_err(|e| {
            PortalError::InputValidation(format!(
                "cannot create destination {}: {e}",
                destination.display()
            ))
        })?;

        let jobs = plan_jobs(&urls, &destination);
        self.host.show_progress(0);
        let observer = HostProgressObserver::new(self.host.clone());
        let batch = self.coordinator.download_all(jobs, &observer).await;

        let mut report = RunReport {
            status: RunStatus::Completed,
            resolved: urls.len(),
            downloaded: batch.succeeded.clone(),
            failed: batch.failed.len(),
            archives_attempted: 0,
            layers: Vec::new(),
        };

        if report.downloaded.is_empty() {
            return Ok(report);
        }

        let load = self.settings.extraction.auto_load
            || self.host.confirm_load(report.downloaded.len()).await;
        if !load {
            return Ok(report);
        }

        let load_report = self.load_layers(report.downloaded.clone()).await;
        report.archives_attempted = load_report.attempted;
        report.layers = load_report.layers;
        Ok(report)
    }

    fn selected_area(&self, requested: &str) -> Result<String, PortalError> {
        let catalog = self.catalog.as_ref().ok_or_else(|| {
            PortalError::InputValidation("the list of areas is not loaded".to_string())
        })?;
        catalog
            .get(requested)
            .map(|area| area.name.clone())
            .ok_or_else(|| PortalError::InputValidation(format!("unknown area '{requested}'")))
    }

    async fn destination(&self) -> Option<PathBuf> {
        match &self.settings.download.output_dir {
            Some(dir) => Some(dir.clone()),
            None => self.host.choose_destination().await,
        }
    }

    /// 解压并登记图层，每个归档独立处理
    pub async fn load_layers(&self, archives: Vec<PathBuf>) -> LoadReport {
        self.host.show_status("Extracting and loading layers...");
        let loader = self.loader.clone();
        let attempted = archives.len();

        let report = match tokio::task::spawn_blocking(move || loader.load_archives(&archives))
            .await
        {
            Ok(report) => report,
            Err(e) => {
                error!("Extraction task failed: {}", e);
                LoadReport {
                    attempted,
                    ..LoadReport::default()
                }
            }
        };

        for layer in &report.layers {
            self.host.register_layer(layer);
        }
        info!(
            "Loaded {} of {} archive(s) as layers",
            report.layers.len(),
            report.attempted
        );
        self.host.show_status(&format!(
            "{} layer(s) loaded into the project!",
            report.layers.len()
        ));
        report
    }

    /// 停止接受新任务并等待正在进行的下载结束
    pub async fn shutdown(&self) {
        info!("Shutting down download pipeline");
        self.coordinator.shutdown().await;
    }
}

/// 为每个地址生成下载任务
///
/// 同名文件加上序号前缀，避免互相覆盖
pub fn plan_jobs(urls: &[String], dir: &Path) -> Vec<DownloadJob> {
    let mut taken: HashSet<PathBuf> = HashSet::new();
    urls.iter()
        .enumerate()
        .map(|(index, url)| {
            let mut job = DownloadJob::for_url(url, dir, index);
            if !taken.insert(job.destination.clone()) {
                let renamed = dir.join(format!("{}-{}", index + 1, job.file_name()));
                taken.insert(renamed.clone());
                job.destination = renamed;
            }
            job
        })
        .collect()
}
