//! 匹配事件与结果接收端

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

/// 检测方式标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMethod {
    /// 主动探测命中
    Active,
    /// 请求侧被动命中
    PassiveRequest,
    /// 响应侧被动命中
    PassiveResponse,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Active => "Active",
            Self::PassiveRequest => "Passive (Request)",
            Self::PassiveResponse => "Passive (Response)",
        };
        f.write_str(label)
    }
}

/// 单条匹配事件记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    /// 完整命中 URL
    pub url: String,
    /// 指纹名称
    pub fingerprint: String,
    /// 指纹类别
    pub fingerprint_type: String,
    /// 检测方式
    pub method: DetectionMethod,
    /// 命中字段描述（hash/match/status 摘要）
    pub matched_field: String,
}

/// 结果接收端（由展示/导出层注入）
pub trait ResultSink: Send + Sync {
    fn record(&self, record: ScanRecord);
}

/// 内存结果接收端（测试与简单嵌入场景）
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ScanRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前累计的全部记录副本
    pub fn snapshot(&self) -> Vec<ScanRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultSink for MemorySink {
    fn record(&self, record: ScanRecord) {
        self.records.lock().unwrap().push(record);
    }
}
