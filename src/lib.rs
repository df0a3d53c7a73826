//! Flare gRPC Discovery
//!
//! Consul-backed service discovery for tonic: an address resolver that long-polls
//! the registry, a weighted round robin picker, and a server lifecycle manager that
//! registers and deregisters services.

pub mod balancer;
pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extension;
pub mod health;
pub mod logging;
pub mod registry;
pub mod retry;
pub mod server;

// Re-exports
pub use balancer::{ErrPicker, Picker, PickerBuilder, WEIGHTED_ROUND_ROBIN, WeightedPicker};
pub use client::{Backend, BalancedChannel, DialOptions, dial};
pub use config::{
    Config, DEFAULT_GROUP, HealthCheckConfig, RegistryConfig, ResolverConfig, ServerConfig,
    WeightsConfig,
};
pub use discovery::{
    Address, Attributes, ClientConn, ConsulResolver, ConsulResolverBuilder, DiscoveryTarget,
    Resolver, ResolverBuilder, ResolverState, Target, WEIGHT_KEY,
};
pub use error::{ErrorCategory, ErrorCode, FlareError, Result};
pub use health::{HealthService, HealthStatus};
pub use logging::init_tracing;
pub use registry::{ConsulClient, RegistrationRecord, RegistryClient};
pub use retry::{BackoffPolicy, ExponentialBackoffPolicy, FixedBackoffPolicy};
pub use server::GrpcServer;
