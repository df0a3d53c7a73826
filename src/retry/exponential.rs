use super::BackoffPolicy;
use crate::config::ResolverConfig;
use rand::Rng;
use std::time::Duration;

/// 带抖动的指数退避策略
///
/// 延迟为 `base * 2^attempt`，上限 `max_delay`，再在 `[1 - jitter, 1 + jitter]`
/// 范围内随机缩放，最终结果仍不超过 `max_delay`
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoffPolicy {
    base_delay: Duration,
    max_delay: Duration,
    jitter: f64,
}

impl ExponentialBackoffPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration, jitter: f64) -> Self {
        Self {
            base_delay,
            max_delay,
            jitter: jitter.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(
            Duration::from_millis(config.backoff_base_ms),
            Duration::from_millis(config.backoff_max_ms),
            config.backoff_jitter,
        )
    }

    fn undithered(&self, attempt: usize) -> Duration {
        let delay_ms = (self.base_delay.as_millis() as u64).saturating_mul(1 << attempt.min(20));
        Duration::from_millis(delay_ms).min(self.max_delay)
    }
}

impl Default for ExponentialBackoffPolicy {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

impl BackoffPolicy for ExponentialBackoffPolicy {
    fn backoff_duration(&self, attempt: usize) -> Duration {
        let delay = self.undithered(attempt);
        if self.jitter == 0.0 || delay.is_zero() {
            return delay;
        }
        let factor = rand::thread_rng().gen_range((1.0 - self.jitter)..=(1.0 + self.jitter));
        delay.mul_f64(factor).min(self.max_delay)
    }
}
