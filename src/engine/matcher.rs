//! 单规则匹配引擎
//! 按 路径门控 → 状态码门控 → 位置分发 的顺序短路求值

use super::sample::{HttpHeader, TrafficSample};
use crate::rule::model::{Rule, RuleLocation};
use crate::utils::hash;

/// 规则匹配器
/// 无内部状态，全部入口为静态方法
pub struct RuleMatcher;

impl RuleMatcher {
    /// 判定单条规则是否命中样本
    #[inline]
    pub fn matches(rule: &Rule, sample: &TrafficSample) -> bool {
        // 1. 路径门控：规则声明了 path 时，仅当样本路径与之等价才允许命中
        if let Some(rule_path) = rule.path.as_deref() {
            if !rule_path.is_empty() && !Self::is_path_match(&sample.path, rule_path) {
                return false;
            }
        }

        // 2. 状态码门控：0 表示样本不携带状态码（请求型样本），不视为不匹配
        if let Some(expected) = rule.status {
            if sample.status_code != 0 && sample.status_code != expected {
                return false;
            }
        }

        // 3. 位置分发（闭合枚举，穷尽处理）
        match &rule.location {
            // 未指定位置时，仅当规则声明了状态码（且已通过门控）才算命中
            None => rule.status.is_some(),
            Some(RuleLocation::Header) => Self::match_header(rule, &sample.headers),
            Some(RuleLocation::Body) => Self::match_body(rule, &sample.body_text),
            Some(RuleLocation::Hash) => Self::match_hash(rule, &sample.body),
            // 状态码已在门控阶段比较，这里只要求规则确实声明了状态码
            Some(RuleLocation::Status) => rule.status.is_some(),
            Some(RuleLocation::Unknown(_)) => false,
        }
    }

    /// 路径等价判定：去查询串、补前导 /、去尾部 /（根除外）、忽略大小写
    pub fn is_path_match(current: &str, expected: &str) -> bool {
        Self::normalize_path(current).eq_ignore_ascii_case(&Self::normalize_path(expected))
    }

    /// 路径规范化
    pub fn normalize_path(path: &str) -> String {
        let stripped = path.split('?').next().unwrap_or(path);
        let mut normalized = if stripped.starts_with('/') {
            stripped.to_string()
        } else {
            format!("/{}", stripped)
        };
        if normalized.len() > 1 && normalized.ends_with('/') {
            normalized.pop();
        }
        normalized
    }

    /// header 匹配：match 列表 AND 逻辑
    /// field 非空时限定在该头字段的值内查找（字段名忽略大小写），否则在任意头的整行文本中查找
    fn match_header(rule: &Rule, headers: &[HttpHeader]) -> bool {
        if rule.match_list.is_empty() {
            return false;
        }
        let field = rule.field.as_deref().filter(|name| !name.is_empty());
        rule.match_list.iter().all(|needle| {
            headers.iter().any(|header| match field {
                Some(name) => {
                    header.name.eq_ignore_ascii_case(name) && header.value.contains(needle)
                }
                None => header.to_string().contains(needle),
            })
        })
    }

    /// body 匹配：全部关键字出现在响应体文本中（区分大小写的字面比较）
    fn match_body(rule: &Rule, body_text: &str) -> bool {
        !rule.match_list.is_empty()
            && rule
                .match_list
                .iter()
                .all(|needle| body_text.contains(needle))
    }

    /// hash 匹配：favicon MurmurHash3 精确比较、MD5 忽略大小写，任一命中即可
    fn match_hash(rule: &Rule, body: &[u8]) -> bool {
        let Some(expected) = rule.hash.as_deref().filter(|h| !h.is_empty()) else {
            return false;
        };
        if body.is_empty() {
            return false;
        }
        if hash::favicon_hash(body) == expected {
            return true;
        }
        hash::md5_hex(body).eq_ignore_ascii_case(expected)
    }
}
