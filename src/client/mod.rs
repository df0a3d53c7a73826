//! gRPC 客户端模块
//!
//! 通过服务发现目标拨号，得到带加权轮询负载均衡的 [`BalancedChannel`]：
//!
//! ```rust,no_run
//! use flare_grpc_discovery::client::{DialOptions, dial};
//!
//! # async fn example() -> flare_grpc_discovery::error::Result<()> {
//! let channel = dial("consul://127.0.0.1:8500/DEFAULT_GROUP/user", DialOptions::new()).await?;
//! # let _ = channel;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod options;

pub use channel::{Backend, BalancedChannel};
pub use options::DialOptions;

use std::sync::Arc;
use tracing::{debug, info};

use crate::discovery::{PASSTHROUGH_SCHEME, Target};
use crate::error::{FlareError, Result};
use crate::extension;
use channel::ConnManager;

/// 按目标拨号
///
/// 目标 scheme 对应已注册的解析器时使用该解析器，否则按 `host:port` 直连。
/// `options.block` 为真时等待第一批后端就绪，最长 `options.connect_timeout`。
pub async fn dial(target: &str, options: DialOptions) -> Result<BalancedChannel> {
    extension::init();

    let parsed = Target::parse(target)?;
    let builder = match parsed.scheme.as_deref().and_then(extension::get_resolver) {
        Some(builder) => builder,
        None => {
            debug!(target = %parsed, "No resolver for target scheme, falling back to passthrough");
            extension::get_resolver(PASSTHROUGH_SCHEME).ok_or_else(|| {
                FlareError::configuration("passthrough resolver is not registered")
            })?
        }
    };

    let block = options.block;
    let connect_timeout = options.connect_timeout;
    let manager = ConnManager::new(parsed.as_str(), options);
    let resolver = builder.build(&parsed, manager.clone())?;
    let channel = BalancedChannel::new(manager, resolver);

    if block {
        channel.wait_ready(connect_timeout).await?;
    }

    info!(
        target = %parsed,
        scheme = builder.scheme(),
        backends = channel.backend_count(),
        "Dialed target"
    );
    Ok(channel)
}
