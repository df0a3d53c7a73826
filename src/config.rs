use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

/// 未指定分组时使用的默认分组
pub const DEFAULT_GROUP: &str = "DEFAULT_GROUP";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.registry.group = normalize_group(&config.registry.group);
        Ok(config)
    }
}

/// 空分组归一化为 [`DEFAULT_GROUP`]
pub fn normalize_group(group: &str) -> String {
    let group = group.trim();
    if group.is_empty() {
        DEFAULT_GROUP.to_string()
    } else {
        group.to_string()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// 注册中心地址（host:port 或 http://host:port）
    #[serde(default = "default_registry_address")]
    pub address: String,
    #[serde(default = "default_group")]
    pub group: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            address: default_registry_address(),
            group: default_group(),
        }
    }
}

fn default_registry_address() -> String {
    "127.0.0.1:8500".to_string()
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// 对外公布的地址；为空时自动探测第一个非回环 IPv4 地址
    #[serde(default)]
    pub advertise_address: Option<String>,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub health_check: HealthCheckConfig,
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_interval_secs: u64,
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_timeout_secs: u64,
    #[serde(default = "default_max_connection_age_secs")]
    pub max_connection_age_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            advertise_address: None,
            weights: WeightsConfig::default(),
            health_check: HealthCheckConfig::default(),
            keepalive_interval_secs: default_keepalive_secs(),
            keepalive_timeout_secs: default_keepalive_secs(),
            max_connection_age_secs: default_max_connection_age_secs(),
        }
    }
}

fn default_port() -> u16 {
    8000
}

fn default_keepalive_secs() -> u64 {
    1
}

fn default_max_connection_age_secs() -> u64 {
    60
}

/// 注册时携带的权重
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WeightsConfig {
    pub passing: i32,
    pub warning: i32,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            passing: 10,
            warning: 1,
        }
    }
}

/// 注册中心对实例执行的健康检查参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// 检查间隔（秒）
    pub interval_secs: u64,
    /// 单次检查超时（秒）
    pub timeout_secs: u64,
    /// 持续失败多久后自动注销（秒）
    pub deregister_after_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_secs: 2,
            timeout_secs: 6,
            deregister_after_secs: 6,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// 长轮询等待时间（秒）
    #[serde(default = "default_wait_time_secs")]
    pub wait_time_secs: u64,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    /// 抖动比例，取值 [0, 1]
    #[serde(default = "default_backoff_jitter")]
    pub backoff_jitter: f64,
}

impl ResolverConfig {
    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            wait_time_secs: default_wait_time_secs(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            backoff_jitter: default_backoff_jitter(),
        }
    }
}

fn default_wait_time_secs() -> u64 {
    10
}

fn default_backoff_base_ms() -> u64 {
    100
}

fn default_backoff_max_ms() -> u64 {
    10_000
}

fn default_backoff_jitter() -> f64 {
    0.2
}
