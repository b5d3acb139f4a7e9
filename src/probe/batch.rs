//! 批量并发探测
//!
//! 以固定并发上限对目标列表执行探测，聚合为批次记录

use crate::probe::executor::ProbeExecutor;
use crate::probe::outcome::{ProbeBatch, ProbeOutcome};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use log::info;
use std::sync::Arc;
use std::time::Instant;

/// 批量探测执行器
///
/// 并发数超过上限时，剩余目标排队等待空闲槽位。
/// 单个目标的失败不影响其他目标，批次结果数恒等于目标数。
pub struct BatchRunner {
    /// 单目标探测执行器
    executor: Arc<dyn ProbeExecutor>,
    /// 并发上限
    max_concurrent: usize,
}

impl BatchRunner {
    /// 创建新的批量探测执行器
    ///
    /// # 参数
    /// * `executor` - 单目标探测执行器
    /// * `max_concurrent` - 并发上限（最小为1）
    ///
    /// # 返回
    /// * `Self` - 执行器实例
    pub fn new(executor: Arc<dyn ProbeExecutor>, max_concurrent: usize) -> Self {
        Self {
            executor,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// 执行一轮批量探测
    ///
    /// # 参数
    /// * `targets` - 目标列表（原始写法，未规范化）
    ///
    /// # 返回
    /// * `ProbeBatch` - 批次记录，结果按完成顺序排列
    pub async fn run(&self, targets: &[String]) -> ProbeBatch {
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            "开始批量探测: {} 个目标, 并发上限 {}",
            targets.len(),
            self.max_concurrent
        );

        let outcomes: Vec<ProbeOutcome> = stream::iter(targets.iter().cloned())
            .map(|target| {
                let executor = Arc::clone(&self.executor);
                async move { executor.probe(&target).await }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        let batch = ProbeBatch::new(started_at, elapsed_ms, outcomes);

        info!(
            "批量探测完成: {} 个目标, 可用 {}, 耗时 {}ms",
            batch.count(),
            batch.up_count(),
            batch.elapsed_ms
        );

        batch
    }
}
