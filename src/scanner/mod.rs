//! 扫描器模块：路径规划、限速、任务执行与主/被动扫描调度
pub mod active;
pub mod executor;
pub mod limiter;
pub mod passive;
pub mod planner;
pub mod scanned;

// 统一导出核心公共接口
pub use active::ActiveScanner;
pub use executor::{InlineExecutor, PooledExecutor, ProbeExecutor, ProbeTask};
pub use limiter::RateLimiter;
pub use passive::PassiveScanner;
pub use planner::{PathPlanner, PlannedPath};
pub use scanned::ScannedSet;
