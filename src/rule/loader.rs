//! 指纹规则加载器
//! 负责指纹列表的 JSON 解析、文件加载与保存

use log::info;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::model::Fingerprint;
use crate::error::{RsfResult, RsfingerError};

/// 指纹规则加载器
/// 单条规则的缺陷（未识别 location、缺失 match 列表）不是错误，
/// 只会产出结构上永不命中的规则；格式层面的 JSON 损坏才会报错
pub struct RuleLoader;

impl RuleLoader {
    /// 从 JSON 文本解析指纹列表
    pub fn from_str(raw: &str) -> RsfResult<Vec<Arc<Fingerprint>>> {
        let list: Vec<Fingerprint> = serde_json::from_str(raw)?;
        Ok(list.into_iter().map(Arc::new).collect())
    }

    /// 从文件加载指纹列表
    pub fn from_file(path: impl AsRef<Path>) -> RsfResult<Vec<Arc<Fingerprint>>> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            RsfingerError::RuleLoadError(format!("读取规则文件 {} 失败: {}", path.display(), e))
        })?;
        let list = Self::from_str(&raw)?;
        info!("Loaded {} fingerprints from {}", list.len(), path.display());
        Ok(list)
    }

    /// 保存指纹列表到文件（带缩进格式，空字段不写出）
    pub fn save_to_file(path: impl AsRef<Path>, fingerprints: &[Arc<Fingerprint>]) -> RsfResult<()> {
        let path = path.as_ref();
        let plain: Vec<&Fingerprint> = fingerprints.iter().map(Arc::as_ref).collect();
        let raw = serde_json::to_string_pretty(&plain)?;
        fs::write(path, raw)?;
        info!("Rules saved to: {}", path.display());
        Ok(())
    }
}
