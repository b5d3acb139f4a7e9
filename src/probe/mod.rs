//! URL探测模块
//!
//! 提供目标规范化、单目标HTTP探测和批量并发探测功能

pub mod batch;
pub mod executor;
pub mod normalize;
pub mod outcome;

// 重新导出主要类型
pub use batch::BatchRunner;
pub use executor::{AttemptOutcome, HttpProber, ProbeExecutor, RetryPolicy};
pub use normalize::normalize_target;
pub use outcome::{ProbeBatch, ProbeOutcome};
