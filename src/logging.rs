//! 日志初始化

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 安装全局 `tracing` 订阅者
///
/// 优先使用 `RUST_LOG`，未设置时使用 `default_directive`（如 `"info"`）。
/// 全局订阅者已存在时直接返回 `Ok`。
pub fn init_tracing(default_directive: &str, json: bool) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive)?,
    };

    let result = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Global tracing subscriber already installed");
    }
    Ok(())
}
