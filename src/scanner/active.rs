//! 主动探测调度器
//! 将触发路径展开为探测计划，经去重与限速后并发下发探测请求

use log::{info, warn};
use rustc_hash::FxHashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::config::ScannerConfig;
use crate::event::{DetectionMethod, ResultSink, ScanRecord};
use crate::rule::{Fingerprint, FingerprintIndex, Rule};
use crate::scanner::executor::{ProbeExecutor, ProbeTask};
use crate::scanner::limiter::RateLimiter;
use crate::scanner::planner::PathPlanner;
use crate::scanner::scanned::ScannedSet;
use crate::transport::{HttpService, HttpTransport, ProbeResponse};
use crate::utils::hash;

/// 关闭时给在途探测的宽限期
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// 主动探测调度器
/// 去重集合与限速器都是实例自有状态，随调度器构造注入，不使用进程级单例
pub struct ActiveScanner {
    index: FingerprintIndex,
    config: Arc<RwLock<ScannerConfig>>,
    limiter: Arc<RateLimiter>,
    scanned: Arc<ScannedSet>,
    executor: Arc<dyn ProbeExecutor>,
    transport: Arc<dyn HttpTransport>,
    sink: Arc<dyn ResultSink>,
}

impl ActiveScanner {
    pub fn new(
        index: FingerprintIndex,
        config: ScannerConfig,
        executor: Arc<dyn ProbeExecutor>,
        transport: Arc<dyn HttpTransport>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.requests_per_second));
        Self {
            index,
            config: Arc::new(RwLock::new(config)),
            limiter,
            scanned: Arc::new(ScannedSet::new()),
            executor,
            transport,
            sink,
        }
    }

    /// 应用新配置：速率与并发上限对后续任务即时生效，在途任务沿用其捕获的旧值
    pub async fn update_config(&self, config: ScannerConfig) {
        self.limiter.set_rate(config.requests_per_second).await;
        self.executor.set_worker_count(config.thread_count);
        *self.config.write().unwrap() = config;
    }

    /// 清空基准路径去重集合（对应“清除结果”动作）
    pub fn clear_cache(&self) {
        self.scanned.clear();
    }

    /// 关闭调度器：停止接收新扫描，在途探测获得固定宽限期
    pub async fn shutdown(&self) {
        self.executor.shutdown(SHUTDOWN_GRACE).await;
    }

    /// 对目标服务执行主动探测，trigger_path 为触发本次探测的请求路径
    pub async fn scan(&self, service: HttpService, trigger_path: &str) {
        let task = self.build_scan_task(service, trigger_path.to_string());
        self.executor.submit(task).await;
    }

    /// 构造一次扫描的外层任务：规划 → 去重 → 分组 → 下发探测单元
    fn build_scan_task(&self, service: HttpService, trigger_path: String) -> ProbeTask {
        let index = self.index.clone();
        let config = self.config.clone();
        let limiter = self.limiter.clone();
        let scanned = self.scanned.clone();
        let executor = self.executor.clone();
        let transport = self.transport.clone();
        let sink = self.sink.clone();

        Box::pin(async move {
            let max_depth = { config.read().unwrap().max_scan_depth };
            for base in PathPlanner::plan(&trigger_path, max_depth) {
                // 基准路径级去重：同一 目标+路径 仅完整探测一次
                let dedup_key = format!("{}{}", service, base.path);
                if !scanned.insert_if_absent(dedup_key) {
                    continue;
                }

                info!(
                    "[*] Starting active scan for: {}{} (depth: {})",
                    service, base.path, base.depth
                );

                for (probe_path, fingerprints) in index.active_rule_groups(base.depth) {
                    let full_path = Self::join_probe_path(&base.path, &probe_path);
                    let probe = Self::build_probe_task(
                        service.clone(),
                        probe_path,
                        full_path,
                        fingerprints,
                        config.clone(),
                        limiter.clone(),
                        transport.clone(),
                        sink.clone(),
                    );
                    executor.submit(probe).await;
                }
            }
        })
    }

    /// 构造单个探测单元：限速 → 发送 → 过滤 → 规则复核 → 发布事件
    /// 每个单元完全自含，单元之间不依赖任何执行顺序
    #[allow(clippy::too_many_arguments)]
    fn build_probe_task(
        service: HttpService,
        probe_path: String,
        full_path: String,
        fingerprints: Vec<Arc<Fingerprint>>,
        config: Arc<RwLock<ScannerConfig>>,
        limiter: Arc<RateLimiter>,
        transport: Arc<dyn HttpTransport>,
        sink: Arc<dyn ResultSink>,
    ) -> ProbeTask {
        Box::pin(async move {
            // 限流：即使多任务并发，总请求速率依然受控
            limiter.acquire().await;

            let response = match transport.send(&service, &full_path).await {
                Ok(response) => response,
                // 单个探测的失败只记录日志，不影响兄弟探测与整体扫描
                Err(e) => {
                    warn!("Active probe failed for {}{}: {}", service, full_path, e);
                    return;
                }
            };

            let (excluded_status, keywords) = {
                let config = config.read().unwrap();
                (
                    config.exclude_status_codes.clone(),
                    config.exclude_body_keywords.clone(),
                )
            };
            if Self::should_discard(&response, &excluded_status, &keywords) {
                return;
            }

            let body_text = response.body_text().into_owned();
            for fingerprint in &fingerprints {
                for rule in &fingerprint.rules {
                    // 只复核规范探测路径恰好等于本次探测路径的规则
                    if rule.effective_probe_path() != Some(probe_path.as_str()) {
                        continue;
                    }
                    if !Self::check_probe_rule(rule, &response, &body_text) {
                        continue;
                    }

                    let url = format!("{}{}", service, full_path);
                    info!("[+] Active match found: {} at {}", fingerprint.name, url);
                    sink.record(ScanRecord {
                        url,
                        fingerprint: fingerprint.name.clone(),
                        fingerprint_type: fingerprint.kind.clone(),
                        method: DetectionMethod::Active,
                        matched_field: Self::describe_probe_match(rule, &full_path),
                    });
                }
            }
        })
    }

    /// 拼接基准路径与探测路径，折叠重复分隔符
    fn join_probe_path(base: &str, probe: &str) -> String {
        let base = base.strip_suffix('/').unwrap_or(base);
        if probe.starts_with('/') {
            format!("{}{}", base, probe)
        } else {
            format!("{}/{}", base, probe)
        }
    }

    /// 噪声抑制：命中排除状态码、空响应体或包含排除关键字的响应直接丢弃
    fn should_discard(
        response: &ProbeResponse,
        excluded_status: &FxHashSet<u16>,
        keywords: &[String],
    ) -> bool {
        if excluded_status.contains(&response.status_code) {
            return true;
        }
        if response.body.is_empty() {
            return true;
        }
        let body_text = response.body_text();
        keywords.iter().any(|keyword| body_text.contains(keyword))
    }

    /// 复核单条规则与探测响应：状态码、关键字列表（AND）、哈希（双算法）逐项校验
    fn check_probe_rule(rule: &Rule, response: &ProbeResponse, body_text: &str) -> bool {
        if let Some(expected) = rule.status {
            if response.status_code != expected {
                return false;
            }
        }

        if !rule.match_list.is_empty()
            && !rule
                .match_list
                .iter()
                .all(|needle| body_text.contains(needle))
        {
            return false;
        }

        if let Some(expected_hash) = rule.hash.as_deref().filter(|h| !h.is_empty()) {
            let murmur = hash::favicon_hash(&response.body);
            let md5 = hash::md5_hex(&response.body);
            if murmur != expected_hash && !md5.eq_ignore_ascii_case(expected_hash) {
                return false;
            }
        }

        true
    }

    /// 构造主动命中的字段描述（hash/match/status 摘要）
    fn describe_probe_match(rule: &Rule, full_path: &str) -> String {
        // 仅声明状态码的规则本质是基于状态码的存活探测
        let location = if rule.status.is_some()
            && rule.match_list.is_empty()
            && rule.hash.as_deref().map_or(true, str::is_empty)
        {
            "status"
        } else {
            rule.location.as_ref().map_or("", |l| l.as_str())
        };

        let mut desc = format!("{}: {}", location, full_path);
        if !rule.match_list.is_empty() {
            desc.push_str(&format!(" (match: {:?})", rule.match_list));
        } else if let Some(expected_hash) = rule.hash.as_deref().filter(|h| !h.is_empty()) {
            desc.push_str(&format!(" (hash: {})", expected_hash));
        } else if let Some(status) = rule.status {
            desc.push_str(&format!(" (status: {})", status));
        }
        desc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RsfResult, RsfingerError};
    use crate::event::MemorySink;
    use crate::rule::RuleLoader;
    use crate::scanner::executor::InlineExecutor;
    use async_trait::async_trait;
    use rustc_hash::FxHashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 脚本化传输：按路径返回预设响应并统计请求次数
    #[derive(Default)]
    struct ScriptedTransport {
        responses: FxHashMap<String, ProbeResponse>,
        hits: AtomicUsize,
    }

    impl ScriptedTransport {
        fn with_response(mut self, path: &str, status_code: u16, body: &[u8]) -> Self {
            self.responses.insert(
                path.to_string(),
                ProbeResponse {
                    status_code,
                    headers: Vec::new(),
                    body: body.to_vec(),
                },
            );
            self
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, _service: &HttpService, path: &str) -> RsfResult<ProbeResponse> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.responses.get(path).cloned().ok_or_else(|| {
                RsfingerError::ProbeError(format!("no scripted response for {}", path))
            })
        }
    }

    fn service() -> HttpService {
        HttpService::new("http", "10.0.0.1", 8080)
    }

    fn scanner_with(
        rules_json: &str,
        transport: ScriptedTransport,
        config: ScannerConfig,
    ) -> (ActiveScanner, Arc<MemorySink>, Arc<ScriptedTransport>) {
        let index =
            FingerprintIndex::new(RuleLoader::from_str(rules_json).expect("rules should parse"));
        let sink = Arc::new(MemorySink::new());
        let transport = Arc::new(transport);
        let scanner = ActiveScanner::new(
            index,
            config,
            Arc::new(InlineExecutor::new()),
            transport.clone(),
            sink.clone(),
        );
        (scanner, sink, transport)
    }

    /// 测试用高速率配置，避免令牌等待拖慢用例
    fn fast_config() -> ScannerConfig {
        ScannerConfig::builder().requests_per_second(10_000.0).build()
    }

    #[tokio::test]
    async fn test_hash_rule_probes_default_favicon_path() {
        let rules = r#"[{"name": "IconApp", "type": "CMS",
            "rules": [{"location": "hash", "hash": "1155597304"}]}]"#;
        let transport =
            ScriptedTransport::default().with_response("/favicon.ico", 200, b"hello");
        let (scanner, sink, transport) = scanner_with(rules, transport, fast_config());

        scanner.scan(service(), "/").await;

        let records = sink.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fingerprint, "IconApp");
        assert_eq!(records[0].url, "http://10.0.0.1:8080/favicon.ico");
        assert_eq!(records[0].method, DetectionMethod::Active);
        assert!(records[0].matched_field.contains("hash"));
        assert_eq!(transport.hits(), 1);
    }

    #[tokio::test]
    async fn test_hash_rule_accepts_md5_case_insensitively() {
        // 声明哈希既不是 favicon 哈希也不是小写 MD5，但等于大写 MD5
        let rules = r#"[{"name": "Md5App",
            "rules": [{"location": "hash", "hash": "5D41402ABC4B2A76B9719D911017C592"}]}]"#;
        let transport =
            ScriptedTransport::default().with_response("/favicon.ico", 200, b"hello");
        let (scanner, sink, _) = scanner_with(rules, transport, fast_config());

        scanner.scan(service(), "/").await;
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_base_path_dedup_suppresses_repeat_scans() {
        let rules = r#"[{"name": "IconApp",
            "rules": [{"location": "hash", "hash": "1155597304"}]}]"#;
        let transport =
            ScriptedTransport::default().with_response("/favicon.ico", 200, b"hello");
        let (scanner, sink, transport) = scanner_with(rules, transport, fast_config());

        scanner.scan(service(), "/").await;
        scanner.scan(service(), "/").await;

        // 第二次触发被基准路径去重拦下，不再发出请求
        assert_eq!(transport.hits(), 1);
        assert_eq!(sink.len(), 1);

        // 清除缓存后允许重新探测
        scanner.clear_cache();
        scanner.scan(service(), "/").await;
        assert_eq!(transport.hits(), 2);
    }

    #[tokio::test]
    async fn test_excluded_responses_never_emit_matches() {
        let rules = r#"[{"name": "Panel",
            "rules": [{"location": "body", "path": "/admin", "match": ["login"]}]}]"#;

        // 排除状态码
        let excluded_status =
            ScriptedTransport::default().with_response("/admin", 404, b"login page");
        let (scanner, sink, _) = scanner_with(rules, excluded_status, fast_config());
        scanner.scan(service(), "/").await;
        assert!(sink.is_empty());

        // 排除关键字
        let excluded_keyword = ScriptedTransport::default().with_response(
            "/admin",
            200,
            b"login - 404 Not Found",
        );
        let (scanner, sink, _) = scanner_with(rules, excluded_keyword, fast_config());
        scanner.scan(service(), "/").await;
        assert!(sink.is_empty());

        // 空响应体
        let empty_body = ScriptedTransport::default().with_response("/admin", 200, b"");
        let (scanner, sink, _) = scanner_with(rules, empty_body, fast_config());
        scanner.scan(service(), "/").await;
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_probe_failure_does_not_abort_siblings() {
        // /missing 无脚本响应（发送报错），/present 正常命中
        let rules = r#"[
            {"name": "Broken", "rules": [{"location": "body", "path": "/missing", "match": ["x"]}]},
            {"name": "Alive", "rules": [{"location": "body", "path": "/present", "match": ["pong"]}]}
        ]"#;
        let transport = ScriptedTransport::default().with_response("/present", 200, b"pong");
        let (scanner, sink, transport) = scanner_with(rules, transport, fast_config());

        scanner.scan(service(), "/").await;

        assert_eq!(transport.hits(), 2);
        let records = sink.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fingerprint, "Alive");
    }

    #[tokio::test]
    async fn test_trigger_path_expands_to_ancestor_bases() {
        let rules = r#"[{"name": "Panel",
            "rules": [{"location": "body", "path": "/login", "match": ["console"], "status": 200}]}]"#;
        let transport = ScriptedTransport::default()
            .with_response("/login", 200, b"console")
            .with_response("/app/login", 200, b"console");
        let config = ScannerConfig::builder()
            .requests_per_second(10_000.0)
            .max_scan_depth(1)
            .build();
        let (scanner, sink, transport) = scanner_with(rules, transport, config);

        // 触发 /app/index.php：基准为 /app 与 /，各探测一次 /login
        scanner.scan(service(), "/app/index.php").await;

        assert_eq!(transport.hits(), 2);
        let mut urls: Vec<String> = sink.snapshot().into_iter().map(|r| r.url).collect();
        urls.sort();
        assert_eq!(
            urls,
            vec![
                "http://10.0.0.1:8080/app/login".to_string(),
                "http://10.0.0.1:8080/login".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_status_only_rule_reports_status_summary() {
        let rules = r#"[{"name": "Probe",
            "rules": [{"path": "/health", "status": 200}]}]"#;
        let transport = ScriptedTransport::default().with_response("/health", 200, b"up");
        let (scanner, sink, _) = scanner_with(rules, transport, fast_config());

        scanner.scan(service(), "/").await;

        let records = sink.snapshot();
        assert_eq!(records.len(), 1);
        assert!(records[0].matched_field.starts_with("status: /health"));
        assert!(records[0].matched_field.contains("(status: 200)"));
    }

    #[test]
    fn test_join_probe_path_collapses_separators() {
        assert_eq!(ActiveScanner::join_probe_path("/", "/favicon.ico"), "/favicon.ico");
        assert_eq!(ActiveScanner::join_probe_path("/app", "/login"), "/app/login");
        assert_eq!(ActiveScanner::join_probe_path("/app", "login"), "/app/login");
    }
}
