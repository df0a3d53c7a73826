//! Consul 注册中心客户端

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{HealthQuery, HealthQueryResult, HealthyInstance, RegistrationRecord, RegistryClient};
use crate::error::{FlareError, Result};

/// Consul 在阻塞查询响应头中返回的一致性索引
const CONSUL_INDEX_HEADER: &str = "X-Consul-Index";

/// 请求超时在长轮询等待时间之外额外预留的余量
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Consul HTTP API 客户端
#[derive(Clone)]
pub struct ConsulClient {
    http_client: HttpClient,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceRegistration<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    name: &'a str,
    tags: Vec<&'a str>,
    address: &'a str,
    port: u16,
    weights: AgentWeights,
    check: AgentServiceCheck,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "PascalCase")]
struct AgentWeights {
    passing: i32,
    warning: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceCheck {
    interval: String,
    timeout: String,
    deregister_critical_service_after: String,
    #[serde(rename = "GRPC")]
    grpc: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceEntry {
    #[serde(default)]
    node: Option<NodeEntry>,
    service: AgentService,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeEntry {
    #[serde(default)]
    address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AgentService {
    #[serde(default)]
    address: String,
    port: u16,
    #[serde(default)]
    weights: Option<AgentWeights>,
}

impl ConsulClient {
    /// 创建 Consul 客户端
    ///
    /// `address` 可以是 `host:port` 或带协议的 `http://host:port`
    pub fn new(address: &str) -> Result<Self> {
        let address = address.trim().trim_end_matches('/');
        if address.is_empty() {
            return Err(FlareError::configuration("empty registry address"));
        }
        let base_url = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        };
        // 提前校验地址，避免在后台任务中才暴露配置错误
        base_url.parse::<http::Uri>()?;

        let http_client = HttpClient::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn ensure_success(resp: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(FlareError::registry(format!("{} failed with status {}", action, status)).with_details(body))
    }
}

fn format_duration(duration: Duration) -> String {
    format!("{}s", duration.as_secs())
}

#[async_trait]
impl RegistryClient for ConsulClient {
    async fn health_service(&self, query: HealthQuery<'_>) -> Result<HealthQueryResult> {
        let url = format!("{}/v1/health/service/{}", self.base_url, query.service_name);

        let mut params: Vec<(&str, String)> = vec![
            ("index", query.wait_index.to_string()),
            ("wait", format_duration(query.wait_time)),
        ];
        if query.only_passing {
            params.push(("passing", "true".to_string()));
        }
        if !query.group.is_empty() {
            params.push(("tag", query.group.to_string()));
        }

        // Consul 会在 wait 基础上附加最多 wait/16 的随机抖动
        let timeout = query.wait_time + query.wait_time / 16 + REQUEST_TIMEOUT_MARGIN;
        let resp = self
            .http_client
            .get(&url)
            .query(&params)
            .timeout(timeout)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "health query").await?;

        let index = resp
            .headers()
            .get(CONSUL_INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| {
                FlareError::deserialization_error(format!("missing or invalid {} header", CONSUL_INDEX_HEADER))
            })?;

        let entries: Vec<ServiceEntry> = resp.json().await?;
        let instances = entries
            .into_iter()
            .map(|entry| {
                let address = if entry.service.address.is_empty() {
                    entry.node.map(|n| n.address).unwrap_or_default()
                } else {
                    entry.service.address
                };
                HealthyInstance {
                    address,
                    port: entry.service.port,
                    passing_weight: entry.service.weights.map(|w| w.passing),
                }
            })
            .collect::<Vec<_>>();

        debug!(
            service = %query.service_name,
            group = %query.group,
            index,
            instances = instances.len(),
            "Health query returned"
        );

        Ok(HealthQueryResult { instances, index })
    }

    async fn service_register(&self, record: &RegistrationRecord) -> Result<()> {
        let url = format!("{}/v1/agent/service/register", self.base_url);
        let payload = AgentServiceRegistration {
            id: &record.service_id,
            name: &record.service_name,
            tags: vec![record.group.as_str()],
            address: &record.address,
            port: record.port,
            weights: AgentWeights {
                passing: record.weights.passing,
                warning: record.weights.warning,
            },
            check: AgentServiceCheck {
                interval: format_duration(record.health_check.interval),
                timeout: format_duration(record.health_check.timeout),
                deregister_critical_service_after: format_duration(record.health_check.deregister_after),
                grpc: record.check_target(),
            },
        };

        let resp = self.http_client.put(&url).json(&payload).send().await?;
        Self::ensure_success(resp, "service register").await?;

        debug!(
            service_id = %record.service_id,
            service = %record.service_name,
            address = %record.check_target(),
            "Service registered with Consul"
        );
        Ok(())
    }

    async fn service_deregister(&self, service_id: &str) -> Result<()> {
        let url = format!("{}/v1/agent/service/deregister/{}", self.base_url, service_id);
        let resp = self.http_client.put(&url).send().await?;
        Self::ensure_success(resp, "service deregister").await?;

        debug!(service_id = %service_id, "Service deregistered from Consul");
        Ok(())
    }
}
