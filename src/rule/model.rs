//! 规则数据模型定义
//! 仅存储规则数据，无任何业务逻辑，支持序列化/反序列化

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// hash 规则缺省的探测路径（Shodan 风格的图标指纹约定）
pub const DEFAULT_FAVICON_PATH: &str = "/favicon.ico";

/// 匹配位置（闭合枚举）
/// 未识别的取值在加载期被标记为 Unknown，匹配期恒为不命中
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleLocation {
    /// 匹配 HTTP 头
    Header,
    /// 匹配响应体文本
    Body,
    /// 匹配响应体哈希（favicon MurmurHash3 / MD5）
    Hash,
    /// 仅匹配状态码
    Status,
    /// 未识别的位置取值（保留原始字符串，便于无损保存）
    Unknown(String),
}

impl RuleLocation {
    /// 大小写不敏感解析，未识别值归入 Unknown
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "header" => Self::Header,
            "body" => Self::Body,
            "hash" => Self::Hash,
            "status" => Self::Status,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Header => "header",
            Self::Body => "body",
            Self::Hash => "hash",
            Self::Status => "status",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for RuleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RuleLocation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RuleLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// 单条匹配规则
/// 规则内 match 列表为 AND 逻辑；指纹内规则之间为 OR 逻辑
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rule {
    /// 匹配位置（header/body/hash/status）；缺省时仅按 status 判定
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<RuleLocation>,

    /// location 为 header 时限定的头字段名（大小写不敏感）；为空则在全部头文本中查找
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// 主动探测路径；非空即标记该规则具备主动探测能力
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// 关键字列表，全部命中才算匹配；JSON 中允许单个字符串写法
    #[serde(
        default,
        rename = "match",
        deserialize_with = "de_match_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub match_list: Vec<String>,

    /// 期望的 HTTP 状态码
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// 期望的内容哈希（favicon MurmurHash3 精确比较 / MD5 忽略大小写）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    /// 规则描述，仅用于展示，无匹配语义
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Rule {
    /// 是否为 hash 位置规则
    pub fn is_hash_rule(&self) -> bool {
        matches!(self.location, Some(RuleLocation::Hash))
    }

    /// 规则的规范探测路径（主动探测分组与响应复核共用的唯一真值）
    /// - 显式声明 path 的规则直接使用该路径
    /// - hash 规则缺省回退为 /favicon.ico
    /// - 其余规则不具备主动探测能力
    pub fn effective_probe_path(&self) -> Option<&str> {
        match self.path.as_deref() {
            Some(path) if !path.is_empty() => Some(path),
            _ if self.is_hash_rule() => Some(DEFAULT_FAVICON_PATH),
            _ => None,
        }
    }
}

/// 兼容 JSON 中 match 字段的两种写法：单个字符串或字符串数组
fn de_match_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(OneOrMany::One(single)) => Ok(vec![single]),
        Some(OneOrMany::Many(list)) => Ok(list),
    }
}

/// 指纹定义：一个技术签名由多条 OR 组合的规则构成
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fingerprint {
    /// 指纹名称（展示标签，唯一标识）
    pub name: String,
    /// 指纹类别（Framework/CMS/Middleware/Operating System/Service）
    #[serde(rename = "type", default)]
    pub kind: String,
    /// 规则列表，任意一条命中即判定指纹命中
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.is_empty() {
            true => write!(f, "{}", self.name),
            false => write!(f, "{} [{}]", self.name, self.kind),
        }
    }
}

/// 单次评估产生的匹配结果：指纹 + 命中规则的下标
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub fingerprint: Arc<Fingerprint>,
    pub rule_index: usize,
}

impl MatchResult {
    pub fn new(fingerprint: Arc<Fingerprint>, rule_index: usize) -> Self {
        Self {
            fingerprint,
            rule_index,
        }
    }

    /// 命中的规则
    pub fn matched_rule(&self) -> &Rule {
        &self.fingerprint.rules[self.rule_index]
    }
}
