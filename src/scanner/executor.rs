//! 探测任务执行器
//! 生产环境使用有界并发的任务池，测试使用同步内联执行器

use async_trait::async_trait;
use log::{debug, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

/// 提交给执行器的任务单元
pub type ProbeTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// 任务提交能力抽象
#[async_trait]
pub trait ProbeExecutor: Send + Sync {
    /// 提交一个任务单元；执行器关闭后的提交被静默丢弃
    async fn submit(&self, task: ProbeTask);

    /// 关闭执行器：停止接收新任务，给在途任务一个宽限期，随后强制取消
    async fn shutdown(&self, grace: Duration);

    /// 调整并发上限（内联执行器忽略该调用）
    fn set_worker_count(&self, workers: usize);
}

/// 有界并发任务池（生产执行器）
/// 任务全部落在当前 tokio 运行时上，许可数决定同时运行的任务上限
pub struct PooledExecutor {
    /// 并发许可（许可数 = 工作任务数上限）
    permits: Arc<Semaphore>,
    /// 当前许可目标值（用于计算扩缩容差值）
    worker_count: AtomicUsize,
    /// 在途与排队任务句柄
    tasks: Mutex<JoinSet<()>>,
    /// 关闭标记
    closed: AtomicBool,
}

impl PooledExecutor {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            worker_count: AtomicUsize::new(workers),
            tasks: Mutex::new(JoinSet::new()),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ProbeExecutor for PooledExecutor {
    async fn submit(&self, task: ProbeTask) {
        if self.closed.load(Ordering::Acquire) {
            debug!("Executor closed, dropping submitted task");
            return;
        }
        let permits = self.permits.clone();
        self.tasks.lock().await.spawn(async move {
            // 许可获取失败说明执行器正在关闭，放弃任务
            let Ok(_permit) = permits.acquire().await else {
                return;
            };
            task.await;
        });
    }

    async fn shutdown(&self, grace: Duration) {
        self.closed.store(true, Ordering::Release);
        let mut tasks = self.tasks.lock().await;
        let deadline = tokio::time::Instant::now() + grace;
        while !tasks.is_empty() {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "Shutdown grace period expired, aborting {} in-flight tasks",
                        tasks.len()
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }
        self.permits.close();
    }

    fn set_worker_count(&self, workers: usize) {
        let workers = workers.max(1);
        let current = self.worker_count.swap(workers, Ordering::AcqRel);
        if workers > current {
            self.permits.add_permits(workers - current);
        } else if workers < current {
            // 缩容：异步回收差值数量的许可，等待在途任务自然释放
            let permits = self.permits.clone();
            let diff = (current - workers) as u32;
            tokio::spawn(async move {
                if let Ok(reclaimed) = permits.acquire_many(diff).await {
                    reclaimed.forget();
                }
            });
        }
    }
}

/// 同步内联执行器（测试用）
/// 提交即就地执行，任务顺序与提交顺序一致，完全确定
#[derive(Debug, Default)]
pub struct InlineExecutor;

impl InlineExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProbeExecutor for InlineExecutor {
    async fn submit(&self, task: ProbeTask) {
        task.await;
    }

    async fn shutdown(&self, _grace: Duration) {}

    fn set_worker_count(&self, _workers: usize) {}
}
