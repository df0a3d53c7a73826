//! 健康检查模块
//!
//! 基于 `tonic-health` 的标准 `grpc.health.v1.Health` 服务，同时在本地记录每个服务的状态。

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tonic_health::ServingStatus;
use tonic_health::pb::health_server::{Health, HealthServer};
use tonic_health::server::HealthReporter;
use tracing::debug;

/// 健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Unknown,
    Serving,
    NotServing,
}

impl From<HealthStatus> for ServingStatus {
    fn from(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Unknown => ServingStatus::Unknown,
            HealthStatus::Serving => ServingStatus::Serving,
            HealthStatus::NotServing => ServingStatus::NotServing,
        }
    }
}

/// 健康检查服务
///
/// 空字符串代表整个服务端的总体状态。
#[derive(Clone)]
pub struct HealthService {
    reporter: HealthReporter,
    statuses: Arc<RwLock<HashMap<String, HealthStatus>>>,
}

impl HealthService {
    /// 创建状态句柄以及需要挂载到服务端的 gRPC 服务
    pub fn new() -> (Self, HealthServer<impl Health>) {
        let (reporter, server) = tonic_health::server::health_reporter();
        let service = Self {
            reporter,
            statuses: Arc::new(RwLock::new(HashMap::new())),
        };
        (service, server)
    }

    pub async fn set_status(&self, service: impl Into<String>, status: HealthStatus) {
        let service = service.into();
        self.reporter
            .set_service_status(&service, status.into())
            .await;
        debug!(service = %service, status = ?status, "Health status updated");
        self.statuses.write().await.insert(service, status);
    }

    pub async fn get_status(&self, service: &str) -> HealthStatus {
        let statuses = self.statuses.read().await;
        statuses
            .get(service)
            .copied()
            .unwrap_or(HealthStatus::Unknown)
    }

    /// 把给定服务以及总体状态标记为 `SERVING`
    pub async fn set_serving<I, S>(&self, services: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_all(services, HealthStatus::Serving).await;
    }

    /// 把给定服务以及总体状态标记为 `NOT_SERVING`
    pub async fn set_not_serving<I, S>(&self, services: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_all(services, HealthStatus::NotServing).await;
    }

    async fn set_all<I, S>(&self, services: I, status: HealthStatus)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_status("", status).await;
        for service in services {
            self.set_status(service, status).await;
        }
    }
}
