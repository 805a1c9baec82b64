// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::download::{BatchProgress, DownloadBatch, JobOutcome};
use crate::domain::models::layer::ExtractedLayer;
use crate::portal::captcha::CaptchaImage;
use crate::workers::coordinator::BatchObserver;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// 宿主界面
///
/// 流水线通过它显示状态、进度和验证码，并在需要时向用户提问。
/// 核心不关心界面如何实现
#[async_trait]
pub trait HostSurface: Send + Sync {
    /// 显示状态文本，替换之前的状态
    fn show_status(&self, message: &str);

    /// 显示 0-100 的进度
    fn show_progress(&self, percent: u8);

    /// 显示新的验证码
    fn show_captcha(&self, image: &CaptchaImage);

    /// 登记一个图层
    fn register_layer(&self, layer: &ExtractedLayer);

    /// 在下载即将开始时选择目标目录，`None` 表示取消
    async fn choose_destination(&self) -> Option<PathBuf>;

    /// 下载结束后询问是否加载图层
    async fn confirm_load(&self, downloaded: usize) -> bool;
}

/// 把批次进度转发给宿主界面
pub struct HostProgressObserver<H: HostSurface + ?Sized> {
    host: Arc<H>,
}

impl<H: HostSurface + ?Sized> HostProgressObserver<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self { host }
    }
}

impl<H: HostSurface + ?Sized> BatchObserver for HostProgressObserver<H> {
    fn on_job_settled(&self, progress: BatchProgress, outcome: &JobOutcome) {
        self.host.show_progress(progress.percent());
        let verb = if outcome.is_success() {
            "Downloaded"
        } else {
            "Failed"
        };
        self.host.show_status(&format!(
            "{verb} {}/{}: {}",
            progress.completed,
            progress.total,
            outcome.job().file_name()
        ));
    }

    fn on_batch_finished(&self, _batch: &DownloadBatch) {
        self.host.show_progress(100);
        self.host.show_status("Download complete!");
    }
}
