//! 注册中心客户端模块
//!
//! 定义服务发现与服务注册共同依赖的注册中心接口，并提供基于 Consul HTTP API 的实现

pub mod consul;
pub mod record;

pub use consul::ConsulClient;
pub use record::{HealthCheckSpec, RegistrationRecord, RegistrationWeights};

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// 健康查询返回的单个实例
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthyInstance {
    pub address: String,
    pub port: u16,
    /// 实例在健康状态下声明的权重，缺失时为 `None`
    pub passing_weight: Option<i32>,
}

/// 一次健康查询的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthQueryResult {
    pub instances: Vec<HealthyInstance>,
    /// 注册中心返回的一致性索引，作为下一次长轮询的 wait index
    pub index: u64,
}

/// 健康查询参数
#[derive(Debug, Clone)]
pub struct HealthQuery<'a> {
    pub service_name: &'a str,
    pub group: &'a str,
    pub only_passing: bool,
    pub wait_index: u64,
    /// 长轮询最长阻塞时间
    pub wait_time: Duration,
}

/// 注册中心客户端 trait
///
/// 地址解析器只使用 `health_service`；服务端生命周期管理只使用注册和注销
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// 阻塞式健康查询：注册中心在状态越过 `wait_index` 或等待超时后才返回
    async fn health_service(&self, query: HealthQuery<'_>) -> Result<HealthQueryResult>;

    /// 注册（或覆盖）服务实例
    async fn service_register(&self, record: &RegistrationRecord) -> Result<()>;

    /// 注销服务实例
    async fn service_deregister(&self, service_id: &str) -> Result<()>;
}
