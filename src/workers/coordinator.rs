// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::download::{BatchProgress, DownloadBatch, DownloadJob, JobOutcome};
use crate::utils::errors::JobError;
use crate::workers::fetcher::FileFetcher;
use futures::FutureExt;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn, Instrument};

/// 批次观察者
///
/// 由聚合点串行调用：每个任务结算时调用一次 `on_job_settled`，
/// 批次进入终态时调用且仅调用一次 `on_batch_finished`
pub trait BatchObserver: Send + Sync {
    fn on_job_settled(&self, _progress: BatchProgress, _outcome: &JobOutcome) {}

    fn on_batch_finished(&self, _batch: &DownloadBatch) {}
}

/// 不做任何事的观察者
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// 下载协调器
///
/// 每个任务作为独立的 tokio 任务运行，信号量限制同时进行的数量；
/// 结果通过通道汇入唯一的聚合循环，由计数决定批次何时结束
pub struct DownloadCoordinator {
    fetcher: Arc<dyn FileFetcher>,
    permits: Arc<Semaphore>,
    concurrency_limit: usize,
    closed: AtomicBool,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl DownloadCoordinator {
    /// 创建协调器
    ///
    /// # 参数
    ///
    /// * `fetcher` - 执行单个任务的获取器
    /// * `concurrency_limit` - 同时进行的任务上限（至少为 1）
    pub fn new(fetcher: Arc<dyn FileFetcher>, concurrency_limit: usize) -> Self {
        let concurrency_limit = concurrency_limit.max(1);
        Self {
            fetcher,
            permits: Arc::new(Semaphore::new(concurrency_limit)),
            concurrency_limit,
            closed: AtomicBool::new(false),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// 下载一批文件
    ///
    /// 任务之间互不依赖，一个失败不会取消其他任务。完成顺序任意。
    /// 关闭后提交的批次中所有任务都以 `JobError::Cancelled` 结算
    ///
    /// # 参数
    ///
    /// * `jobs` - 要下载的任务
    /// * `observer` - 进度与完成通知
    ///
    /// # 返回值
    ///
    /// 处于终态的批次（`completed == total`）
    pub async fn download_all(
        &self,
        jobs: Vec<DownloadJob>,
        observer: &dyn BatchObserver,
    ) -> DownloadBatch {
        let batch = DownloadBatch::new(jobs.len());
        let span = info_span!("download_batch", batch_id = %batch.id, total = batch.total);
        self.run_batch(batch, jobs, observer).instrument(span).await
    }

    async fn run_batch(
        &self,
        mut batch: DownloadBatch,
        jobs: Vec<DownloadJob>,
        observer: &dyn BatchObserver,
    ) -> DownloadBatch {
        info!(
            "Starting {} download(s) with up to {} in parallel",
            batch.total, self.concurrency_limit
        );

        let (tx, mut rx) = mpsc::unbounded_channel::<JobOutcome>();
        for job in jobs {
            if self.is_closed() {
                let _ = tx.send(JobOutcome::Failed {
                    job,
                    error: JobError::Cancelled,
                });
                continue;
            }

            let tx = tx.clone();
            let permits = self.permits.clone();
            let fetcher = self.fetcher.clone();
            let handle = tokio::spawn(
                async move {
                    let outcome = match permits.acquire_owned().await {
                        Ok(_permit) => {
                            let result = AssertUnwindSafe(fetcher.fetch(&job)).catch_unwind().await;
                            match result {
                                Ok(Ok(bytes)) => JobOutcome::Succeeded { job, bytes },
                                Ok(Err(error)) => JobOutcome::Failed { job, error },
                                Err(_) => JobOutcome::Failed {
                                    job,
                                    error: JobError::Aborted("fetcher panicked".to_string()),
                                },
                            }
                        }
                        // Semaphore closed by shutdown before this job got a slot.
                        Err(_) => JobOutcome::Failed {
                            job,
                            error: JobError::Cancelled,
                        },
                    };
                    let _ = tx.send(outcome);
                }
                .in_current_span(),
            );
            self.track(handle);
        }
        drop(tx);

        if batch.is_terminal() {
            observer.on_batch_finished(&batch);
            return batch;
        }

        while let Some(outcome) = rx.recv().await {
            match &outcome {
                JobOutcome::Succeeded { job, bytes } => {
                    info!("Downloaded {} ({} bytes)", job.file_name(), bytes)
                }
                JobOutcome::Failed { job, error } => {
                    warn!("Failed to download {}: {}", job.url, error)
                }
            }

            let progress = BatchProgress {
                completed: batch.completed + 1,
                total: batch.total,
            };
            observer.on_job_settled(progress, &outcome);
            batch.record(outcome);

            if batch.is_terminal() {
                info!(
                    "Batch finished: {} succeeded, {} failed",
                    batch.succeeded.len(),
                    batch.failed.len()
                );
                observer.on_batch_finished(&batch);
                break;
            }
        }

        batch
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// 关闭协调器
    ///
    /// 不再接受新任务，尚未取得名额的任务以取消结算，
    /// 并等待所有正在进行的任务结束
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.permits.close();

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.handles.lock());
        info!("Waiting for {} download task(s) to drain", handles.len());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Download task ended abnormally: {}", e);
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;
