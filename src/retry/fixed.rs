use super::BackoffPolicy;
use std::time::Duration;

/// 固定延迟退避策略
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoffPolicy {
    delay: Duration,
}

impl FixedBackoffPolicy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// 失败后立即重试，不做任何等待
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl BackoffPolicy for FixedBackoffPolicy {
    fn backoff_duration(&self, _attempt: usize) -> Duration {
        self.delay
    }
}
