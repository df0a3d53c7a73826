//! 服务发现模块
//!
//! 解析 `consul://registryHost/group/serviceName` 形式的目标，
//! 持续长轮询注册中心，并把完整的健康实例列表推送给连接管理器。

pub mod address;
pub mod consul;
pub mod passthrough;
pub mod resolver;
pub mod target;

pub use address::{Address, Attributes, ResolverState, WEIGHT_KEY, normalize_weight};
pub use consul::{CONSUL_SCHEME, ConsulResolver, ConsulResolverBuilder};
pub use passthrough::{PASSTHROUGH_SCHEME, PassthroughResolverBuilder};
pub use resolver::{ClientConn, Resolver, ResolverBuilder};
pub use target::{DiscoveryTarget, Target};
