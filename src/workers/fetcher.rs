// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::download::DownloadJob;
use crate::portal::session::PortalSession;
use crate::utils::errors::JobError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

/// 文件获取器
///
/// 下载协调器通过它执行单个任务
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// 执行下载，返回写入的字节数
    async fn fetch(&self, job: &DownloadJob) -> Result<u64, JobError>;
}

/// 基于门户会话的HTTP获取器
///
/// 复用会话的客户端（及其 cookie），按块写入 `<目标>.part`，
/// 完整写入后再重命名为目标文件
#[derive(Debug, Clone)]
pub struct HttpFileFetcher {
    client: reqwest::Client,
    timeout: Duration,
    buffer_size: usize,
}

impl HttpFileFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration, buffer_size: usize) -> Self {
        Self {
            client,
            timeout,
            buffer_size: buffer_size.max(1),
        }
    }

    /// 使用会话的客户端和下载超时构建
    pub fn from_session(session: &PortalSession, buffer_size: usize) -> Self {
        Self::new(
            session.client().clone(),
            session.timeouts().download(),
            buffer_size,
        )
    }

    async fn stream_to(&self, job: &DownloadJob, part_path: &Path) -> Result<u64, JobError> {
        let mut response = self
            .client
            .get(&job.url)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(JobError::HttpStatus(status.as_u16()));
        }

        if let Some(parent) = job.destination.parent() {
            fs::create_dir_all(parent).await?;
        }

        let file = fs::File::create(part_path).await?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        writer.flush().await?;
        writer.into_inner().sync_all().await?;
        Ok(written)
    }
}

/// 临时文件路径：在目标文件名后追加 `.part`
pub fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

#[async_trait]
impl FileFetcher for HttpFileFetcher {
    async fn fetch(&self, job: &DownloadJob) -> Result<u64, JobError> {
        let part = part_path(&job.destination);
        debug!("Downloading {} -> {}", job.url, job.destination.display());

        let result = match self.stream_to(job, &part).await {
            Ok(bytes) => fs::rename(&part, &job.destination)
                .await
                .map(|_| bytes)
                .map_err(JobError::from),
            Err(e) => Err(e),
        };

        if result.is_err() {
            // Never leave a truncated file behind.
            if let Err(remove_err) = fs::remove_file(&part).await {
                if remove_err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove partial file {}: {}", part.display(), remove_err);
                }
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod tests;
