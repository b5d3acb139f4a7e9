//! 探测目标管理模块
//!
//! 提供目标来源抽象和带回退的目标解析功能

pub mod resolver;
pub mod source;

// 重新导出主要类型
pub use resolver::TargetResolver;
pub use source::{FileTargetSource, TargetSource};
