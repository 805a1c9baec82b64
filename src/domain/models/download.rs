// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::JobError;
use std::path::{Path, PathBuf};
use url::Url;
use uuid::Uuid;

/// 单个下载任务：一个远程文件对应一个本地路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// 源地址
    pub url: String,
    /// 目标路径
    pub destination: PathBuf,
}

impl DownloadJob {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
        }
    }

    /// 根据URL最后一段路径在目标目录下构建任务
    ///
    /// # 参数
    ///
    /// * `url` - 文件地址
    /// * `dir` - 目标目录
    /// * `index` - 在批次中的序号，用于无法得到文件名时的后备名称
    pub fn for_url(url: &str, dir: &Path, index: usize) -> Self {
        let filename =
            filename_from_url(url).unwrap_or_else(|| format!("download-{}.zip", index + 1));
        Self::new(url, dir.join(filename))
    }

    /// 目标文件名（用于状态显示）
    pub fn file_name(&self) -> String {
        self.destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.url.clone())
    }
}

/// 取URL的最后一个非空路径段作为文件名
///
/// 段经过百分号解码；包含路径分隔符或 `.`/`..` 的段视为不可用
pub fn filename_from_url(url: &str) -> Option<String> {
    let raw_segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .map(str::to_string),
        // Fall back to plain splitting for relative references.
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').find(|s| !s.is_empty()))
            .map(str::to_string),
    }?;

    let decoded = urlencoding::decode(&raw_segment)
        .map(|s| s.into_owned())
        .unwrap_or(raw_segment);
    let name = decoded.trim();

    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return None;
    }
    Some(name.to_string())
}

/// 单个任务的结算结果
#[derive(Debug)]
pub enum JobOutcome {
    /// 下载成功，附带写入的字节数
    Succeeded { job: DownloadJob, bytes: u64 },
    /// 下载失败
    Failed { job: DownloadJob, error: JobError },
}

impl JobOutcome {
    pub fn job(&self) -> &DownloadJob {
        match self {
            JobOutcome::Succeeded { job, .. } | JobOutcome::Failed { job, .. } => job,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded { .. })
    }
}

/// 失败任务及原因
#[derive(Debug)]
pub struct FailedJob {
    pub job: DownloadJob,
    pub reason: JobError,
}

/// 批次进度快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    /// 已完成比例，空批次视为 1.0
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }

    /// 0-100 的整数进度
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed * 100) / self.total).min(100) as u8
    }

    pub fn is_terminal(&self) -> bool {
        self.completed == self.total
    }
}

/// 一次下载运行的汇总
///
/// 只在聚合点被修改；`completed == total` 时为终态
#[derive(Debug)]
pub struct DownloadBatch {
    pub id: Uuid,
    pub total: usize,
    pub completed: usize,
    /// 成功的目标路径，顺序无意义
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<FailedJob>,
}

impl DownloadBatch {
    pub fn new(total: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            total,
            completed: 0,
            succeeded: Vec::with_capacity(total),
            failed: Vec::new(),
        }
    }

    /// 记录一个任务结果，并返回记录后的进度
    pub fn record(&mut self, outcome: JobOutcome) -> BatchProgress {
        match outcome {
            JobOutcome::Succeeded { job, .. } => self.succeeded.push(job.destination),
            JobOutcome::Failed { job, error } => self.failed.push(FailedJob { job, reason: error }),
        }
        self.completed += 1;
        self.progress()
    }

    pub fn progress(&self) -> BatchProgress {
        BatchProgress {
            completed: self.completed,
            total: self.total,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.completed == self.total
    }
}
