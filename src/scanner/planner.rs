//! 探测路径规划
//! 将触发路径向上展开为受深度约束的祖先目录集合

/// 规划出的单个探测基准路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPath {
    /// 基准路径（尾部斜杠已去除，根目录除外）
    pub path: String,
    /// 目录深度（根为 0，/a 为 1，/a/b 为 2）
    pub depth: usize,
}

/// 路径规划器
pub struct PathPlanner;

impl PathPlanner {
    /// 从触发路径推导全部待探测的祖先基准路径
    /// 规则：
    /// 1. 逐级上移收集祖先目录，直至根
    /// 2. 文件型祖先（去根后含 . 的路径）不作为递归扫描基准
    /// 3. 深度超过 max_depth 的祖先直接丢弃
    pub fn plan(trigger_path: &str, max_depth: usize) -> Vec<PlannedPath> {
        let mut current = if trigger_path.starts_with('/') {
            trigger_path.to_string()
        } else {
            format!("/{}", trigger_path)
        };

        let mut bases = Vec::new();
        loop {
            // 去掉末尾斜杠后的路径作为扫描基准
            let scan_base = if current.len() > 1 && current.ends_with('/') {
                current[..current.len() - 1].to_string()
            } else {
                current.clone()
            };
            bases.push(scan_base);

            if current == "/" {
                break;
            }

            // 向上移动一级：截断到上一个斜杠（含）
            let bytes = current.as_bytes();
            let from = bytes.len() - if current.ends_with('/') { 2 } else { 1 };
            current = match bytes[..=from].iter().rposition(|&b| b == b'/') {
                Some(index) => current[..index + 1].to_string(),
                None => "/".to_string(),
            };
        }

        bases
            .into_iter()
            .filter(|base| base == "/" || !base.contains('.'))
            .filter_map(|base| {
                let depth = Self::depth_of(&base);
                (depth <= max_depth).then_some(PlannedPath { path: base, depth })
            })
            .collect()
    }

    /// 计算路径的目录深度：根为 0，/a 为 1，/a/b 为 2
    /// 文件型路径（最后一个斜杠之后含点）按其所在目录计算
    pub fn depth_of(path: &str) -> usize {
        if path.is_empty() || path == "/" {
            return 0;
        }

        let dir_path = match (path.rfind('/'), path.rfind('.')) {
            (Some(slash), Some(dot)) if dot > slash => &path[..slash + 1],
            _ => path,
        };

        let trimmed = dir_path.trim_start_matches('/').trim_end_matches('/');
        if trimmed.is_empty() {
            return 0;
        }
        trimmed.matches('/').count() + 1
    }
}
