//! 探测结果数据结构
//!
//! 定义单目标探测结果和批次记录类型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 单个目标的探测结果
///
/// `error` 与 `status_code` 互斥：收到HTTP响应时填充状态码，
/// 传输层失败时填充错误描述，两者不会同时存在。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// 原始目标（配置中的写法，未规范化）
    pub target: String,
    /// 实际请求的URL（规范化后）
    pub url: String,
    /// 目标是否可用（状态码 < 400）
    pub up: bool,
    /// HTTP状态码（收到响应时存在）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// 累计耗时（毫秒），覆盖所有尝试与重试等待
    pub latency_ms: u64,
    /// 错误描述（未收到响应时存在）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeOutcome {
    /// 创建收到HTTP响应的探测结果
    ///
    /// # 参数
    /// * `target` - 原始目标
    /// * `url` - 规范化后的URL
    /// * `status_code` - HTTP状态码
    /// * `latency_ms` - 累计耗时（毫秒）
    ///
    /// # 返回
    /// * `Self` - 探测结果实例
    pub fn from_response(target: String, url: String, status_code: u16, latency_ms: u64) -> Self {
        Self {
            target,
            url,
            up: status_code < 400,
            status_code: Some(status_code),
            latency_ms,
            error: None,
        }
    }

    /// 创建传输层失败的探测结果
    ///
    /// # 参数
    /// * `target` - 原始目标
    /// * `url` - 规范化后的URL
    /// * `error` - 错误描述
    /// * `latency_ms` - 累计耗时（毫秒）
    ///
    /// # 返回
    /// * `Self` - 探测结果实例
    pub fn from_failure(target: String, url: String, error: String, latency_ms: u64) -> Self {
        Self {
            target,
            url,
            up: false,
            status_code: None,
            latency_ms,
            error: Some(error),
        }
    }

    /// 转换为JSON字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 从JSON字符串创建
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// 一次批量探测的完整记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeBatch {
    /// 批次ID
    pub id: Uuid,
    /// 批次开始时间
    pub started_at: DateTime<Utc>,
    /// 批次总耗时（毫秒）
    pub elapsed_ms: u64,
    /// 各目标的探测结果（按完成顺序）
    pub outcomes: Vec<ProbeOutcome>,
}

impl ProbeBatch {
    /// 创建新的批次记录
    pub fn new(started_at: DateTime<Utc>, elapsed_ms: u64, outcomes: Vec<ProbeOutcome>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at,
            elapsed_ms,
            outcomes,
        }
    }

    /// 批次中的目标总数
    pub fn count(&self) -> usize {
        self.outcomes.len()
    }

    /// 批次中可用目标的数量
    pub fn up_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.up).count()
    }
}
