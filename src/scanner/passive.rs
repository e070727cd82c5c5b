//! 被动扫描器
//! 对拦截到的请求/响应样本执行被动匹配，并在启用时触发主动探测

use log::info;
use rustc_hash::FxHashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::engine::TrafficSample;
use crate::event::{DetectionMethod, ResultSink, ScanRecord};
use crate::rule::{FingerprintIndex, MatchResult};
use crate::scanner::active::ActiveScanner;
use crate::scanner::scanned::ScannedSet;
use crate::transport::HttpService;

/// 被动扫描器
pub struct PassiveScanner {
    index: FingerprintIndex,
    sink: Arc<dyn ResultSink>,
    active_scanner: Option<Arc<ActiveScanner>>,
    /// 主动探测开关
    active_scan_enabled: AtomicBool,
    /// 已被动评估过的 URL 集合
    scanned_urls: ScannedSet,
}

impl PassiveScanner {
    pub fn new(
        index: FingerprintIndex,
        sink: Arc<dyn ResultSink>,
        active_scanner: Option<Arc<ActiveScanner>>,
    ) -> Self {
        Self {
            index,
            sink,
            active_scanner,
            active_scan_enabled: AtomicBool::new(true),
            scanned_urls: ScannedSet::new(),
        }
    }

    pub fn set_active_scan_enabled(&self, enabled: bool) {
        self.active_scan_enabled.store(enabled, Ordering::Release);
    }

    pub fn is_active_scan_enabled(&self) -> bool {
        self.active_scan_enabled.load(Ordering::Acquire)
    }

    /// 处理请求型样本：仅做被动匹配（样本状态码为 0 哨兵值）
    pub fn on_request(&self, url: &str, sample: &TrafficSample) {
        let matches = self.index.find_passive_matches(sample);
        if !matches.is_empty() {
            self.emit_matches(url, &matches, DetectionMethod::PassiveRequest);
        }
    }

    /// 处理响应型样本：被动匹配 + 触发主动探测
    pub async fn on_response(&self, service: &HttpService, sample: &TrafficSample) {
        let url = format!("{}{}", service, sample.path);

        // URL 级去重：同一 URL 只做一次被动评估
        if self.scanned_urls.insert_if_absent(url.clone()) {
            let matches = self.index.find_passive_matches(sample);
            if !matches.is_empty() {
                self.emit_matches(&url, &matches, DetectionMethod::PassiveResponse);
            }
        }

        // 触发主动探测（查询串在路径规划前剥离）
        if self.is_active_scan_enabled() {
            if let Some(active) = &self.active_scanner {
                let base_path = sample.path.split('?').next().unwrap_or(&sample.path);
                active.scan(service.clone(), base_path).await;
            }
        }
    }

    /// 发布匹配事件（同一 URL 下同名指纹只发布一条）
    fn emit_matches(&self, url: &str, matches: &[MatchResult], method: DetectionMethod) {
        info!("[+] Found {} fingerprint(s) at {}", method, url);

        let mut emitted: FxHashSet<&str> = FxHashSet::default();
        for result in matches {
            let fingerprint = &result.fingerprint;
            if !emitted.insert(fingerprint.name.as_str()) {
                continue;
            }
            self.sink.record(ScanRecord {
                url: url.to_string(),
                fingerprint: fingerprint.name.clone(),
                fingerprint_type: fingerprint.kind.clone(),
                method,
                matched_field: Self::describe_match(result),
            });
        }
    }

    /// 构造被动命中的字段描述
    /// 规则自带描述时优先展示；否则拼接 位置 (字段): 关键字列表
    fn describe_match(result: &MatchResult) -> String {
        let rule = result.matched_rule();
        let location = rule.location.as_ref().map_or("", |l| l.as_str());

        if let Some(description) = rule.description.as_deref().filter(|d| !d.is_empty()) {
            return format!("[{}] {}", description, location);
        }

        let mut field_desc = location.to_string();
        if let Some(field) = rule.field.as_deref().filter(|f| !f.is_empty()) {
            field_desc.push_str(&format!(" ({})", field));
        }
        if !rule.match_list.is_empty() {
            field_desc.push_str(&format!(": {:?}", rule.match_list));
        }
        field_desc
    }

    /// 清空被动与主动两级去重缓存
    pub fn clear_cache(&self) {
        self.scanned_urls.clear();
        if let Some(active) = &self.active_scanner {
            active.clear_cache();
        }
    }
}
