//! 服务注册记录

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{HealthCheckConfig, WeightsConfig};

/// 注册记录携带的权重
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationWeights {
    pub passing: i32,
    pub warning: i32,
}

impl From<WeightsConfig> for RegistrationWeights {
    fn from(config: WeightsConfig) -> Self {
        Self {
            passing: config.passing,
            warning: config.warning,
        }
    }
}

/// 注册中心对实例执行的 gRPC 健康检查描述
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckSpec {
    pub interval: Duration,
    pub timeout: Duration,
    /// 健康检查持续失败超过该时长后，注册中心自动注销实例
    pub deregister_after: Duration,
}

impl From<HealthCheckConfig> for HealthCheckSpec {
    fn from(config: HealthCheckConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
            deregister_after: Duration::from_secs(config.deregister_after_secs),
        }
    }
}

/// 一个对外暴露服务的注册记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub service_id: String,
    pub service_name: String,
    pub group: String,
    pub address: String,
    pub port: u16,
    pub weights: RegistrationWeights,
    pub health_check: HealthCheckSpec,
}

impl RegistrationRecord {
    pub fn new(
        service_name: impl Into<String>,
        group: impl Into<String>,
        address: impl Into<String>,
        port: u16,
        weights: RegistrationWeights,
        health_check: HealthCheckSpec,
    ) -> Self {
        let service_name = service_name.into();
        let group = group.into();
        let address = address.into();
        Self {
            service_id: service_id(&group, &service_name, &address, port),
            service_name,
            group,
            address,
            port,
            weights,
            health_check,
        }
    }

    /// 健康检查探测的目标地址
    pub fn check_target(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// 由分组、服务名、地址和端口确定性地生成实例 ID
///
/// 同一实例重启后重新注册会覆盖旧记录而不是产生重复记录。
/// 字段本身包含 `:` 时可能发生碰撞，这里保持与已部署实例相同的格式。
pub fn service_id(group: &str, service_name: &str, address: &str, port: u16) -> String {
    format!("{}:{}:{}:{}", group, service_name, address, port)
}
