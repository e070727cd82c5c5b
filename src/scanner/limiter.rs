//! 令牌桶限速器
//! 所有并发探测共享一个桶，使聚合请求速率与工作任务数解耦

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// 桶内状态
#[derive(Debug)]
struct BucketState {
    /// 当前可用令牌数
    tokens: f64,
    /// 上次补充令牌的时间点
    refreshed_at: Instant,
    /// 每秒补充的令牌数
    rate: f64,
}

/// 令牌桶限速器（突发容量固定为 1，严格平滑放行）
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<BucketState>,
}

impl RateLimiter {
    /// 创建限速器，rate 为每秒允许的请求数（非正或非有限值回退为 1.0）
    pub fn new(rate: f64) -> Self {
        Self {
            state: Mutex::new(BucketState {
                tokens: 1.0,
                refreshed_at: Instant::now(),
                rate: Self::sanitize(rate),
            }),
        }
    }

    fn sanitize(rate: f64) -> f64 {
        if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            1.0
        }
    }

    /// 调整速率，仅影响后续的令牌补充；正在等待的任务沿用其已计算的等待时长
    pub async fn set_rate(&self, rate: f64) {
        let mut state = self.state.lock().await;
        state.rate = Self::sanitize(rate);
    }

    /// 获取一个放行许可，必要时挂起等待令牌补充
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.refreshed_at).as_secs_f64();
                state.tokens = (state.tokens + elapsed * state.rate).min(1.0);
                state.refreshed_at = now;
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - state.tokens) / state.rate)
            };
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_acquire_paces_to_configured_rate() {
        let limiter = RateLimiter::new(10.0);
        let started = Instant::now();

        // 首个许可消耗突发令牌，后续两个各需等待 100ms 补充
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200), "elapsed: {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(400), "elapsed: {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_rate_applies_to_subsequent_acquires() {
        let limiter = RateLimiter::new(1.0);
        limiter.acquire().await;

        limiter.set_rate(100.0).await;
        let started = Instant::now();
        limiter.acquire().await;
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_invalid_rate_falls_back() {
        assert_eq!(RateLimiter::sanitize(0.0), 1.0);
        assert_eq!(RateLimiter::sanitize(-3.0), 1.0);
        assert_eq!(RateLimiter::sanitize(f64::NAN), 1.0);
        assert_eq!(RateLimiter::sanitize(25.0), 25.0);
    }
}
