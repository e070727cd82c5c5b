//! 指纹索引：在只读规则列表上划分被动/主动两类视图

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::model::{Fingerprint, MatchResult};
use crate::engine::{RuleMatcher, TrafficSample};

/// 指纹索引（对加载完成的规则列表的只读视图）
/// 规则列表在扫描期间不发生变更，索引仅持有共享引用
#[derive(Clone)]
pub struct FingerprintIndex {
    fingerprints: Arc<Vec<Arc<Fingerprint>>>,
}

impl FingerprintIndex {
    pub fn new(fingerprints: Vec<Arc<Fingerprint>>) -> Self {
        Self {
            fingerprints: Arc::new(fingerprints),
        }
    }

    /// 规则列表只读访问
    pub fn fingerprints(&self) -> &[Arc<Fingerprint>] {
        &self.fingerprints
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    /// 被动匹配：遍历所有指纹/规则对，收集全部命中（不止首个）
    /// 返回顺序跟随规则列表的加载顺序，对固定输入完全确定
    pub fn find_passive_matches(&self, sample: &TrafficSample) -> Vec<MatchResult> {
        let mut matches = Vec::new();
        for fingerprint in self.fingerprints.iter() {
            for (rule_index, rule) in fingerprint.rules.iter().enumerate() {
                if RuleMatcher::matches(rule, sample) {
                    matches.push(MatchResult::new(fingerprint.clone(), rule_index));
                }
            }
        }
        matches
    }

    /// 主动探测分组：探测路径 → 共享该路径的指纹集合
    /// 同一路径只需发起一次请求即可服务多个指纹
    /// hash 规则仅在深度 0 参与（图标探测只对站点根有意义）
    pub fn active_rule_groups(&self, depth: usize) -> FxHashMap<String, Vec<Arc<Fingerprint>>> {
        let mut groups: FxHashMap<String, Vec<Arc<Fingerprint>>> = FxHashMap::default();
        for fingerprint in self.fingerprints.iter() {
            for rule in &fingerprint.rules {
                let Some(path) = rule.effective_probe_path() else {
                    continue;
                };
                if rule.is_hash_rule() && depth != 0 {
                    continue;
                }
                let group = groups.entry(path.to_string()).or_default();
                // 同一指纹的多条规则可能指向同一路径，避免重复入组
                if !group.iter().any(|existing| Arc::ptr_eq(existing, fingerprint)) {
                    group.push(fingerprint.clone());
                }
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HttpHeader;
    use crate::rule::loader::RuleLoader;

    fn sample_index() -> FingerprintIndex {
        let raw = r#"[
            {
                "name": "Shiro",
                "type": "Framework",
                "rules": [{"location": "header", "match": ["rememberMe="]}]
            },
            {
                "name": "IconApp",
                "type": "CMS",
                "rules": [{"location": "hash", "hash": "1155597304"}]
            },
            {
                "name": "AdminPanel",
                "type": "Service",
                "rules": [
                    {"location": "body", "path": "/admin/login", "match": ["console"]},
                    {"location": "header", "match": ["X-Admin"]}
                ]
            }
        ]"#;
        FingerprintIndex::new(RuleLoader::from_str(raw).expect("rules should parse"))
    }

    #[test]
    fn test_passive_matches_collects_all_hits() {
        let index = sample_index();
        let sample = TrafficSample::response(
            "/",
            200,
            vec![
                HttpHeader::new("Set-Cookie", "rememberMe=deleteMe"),
                HttpHeader::new("X-Admin", "1"),
            ],
            Vec::new(),
        );

        let matches = index.find_passive_matches(&sample);
        let names: Vec<&str> = matches
            .iter()
            .map(|result| result.fingerprint.name.as_str())
            .collect();
        assert_eq!(names, vec!["Shiro", "AdminPanel"]);
    }

    #[test]
    fn test_active_groups_include_hash_default_only_at_root_depth() {
        let index = sample_index();

        let root_groups = index.active_rule_groups(0);
        assert!(root_groups.contains_key("/favicon.ico"));
        assert!(root_groups.contains_key("/admin/login"));

        // 深度 1 起 hash 规则退出分组，路径规则保留
        let deep_groups = index.active_rule_groups(1);
        assert!(!deep_groups.contains_key("/favicon.ico"));
        assert!(deep_groups.contains_key("/admin/login"));
    }

    #[test]
    fn test_shared_probe_path_groups_multiple_fingerprints() {
        let raw = r#"[
            {"name": "A", "rules": [{"location": "body", "path": "/x", "match": ["a"]}]},
            {"name": "B", "rules": [{"location": "body", "path": "/x", "match": ["b"]}]}
        ]"#;
        let index = FingerprintIndex::new(RuleLoader::from_str(raw).expect("parse"));
        let groups = index.active_rule_groups(0);
        assert_eq!(groups.get("/x").map(Vec::len), Some(2));
    }
}
