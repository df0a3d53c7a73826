//! 重试退避策略模块
//!
//! 服务发现的 watch 循环在注册中心查询失败时使用这些策略决定下一次重试前的等待时间

pub mod exponential;
pub mod fixed;

pub use exponential::ExponentialBackoffPolicy;
pub use fixed::FixedBackoffPolicy;

use std::time::Duration;

/// 退避策略 trait
pub trait BackoffPolicy: Send + Sync {
    /// 第 `attempt` 次连续失败（从 0 开始）之后的等待时间
    fn backoff_duration(&self, attempt: usize) -> Duration;
}
