//! gRPC 服务端模块
//!
//! [`GrpcServer`] 负责服务端的注册生命周期：
//! 1. 构造时确定对外公布的 IPv4 地址
//! 2. `register_service` 只记录服务，不访问注册中心
//! 3. `serve` 绑定端口、注册全部服务并开始处理请求
//! 4. 收到终止信号后优雅停止，再逐个注销服务

pub mod net;
pub mod signal;

pub use net::{first_non_loopback_ipv4, outbound_ipv4, wait_for_port};
pub use signal::shutdown_signal;

use std::convert::Infallible;
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::body::Body;
use tonic::server::NamedService;
use tonic::service::RoutesBuilder;
use tonic::transport::Server;
use tower::Service;
use tracing::{error, info, warn};

use crate::config::{Config, ServerConfig, normalize_group};
use crate::error::{FlareError, Result};
use crate::health::HealthService;
use crate::registry::{ConsulClient, RegistrationRecord, RegistryClient};

const READY_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// 带服务注册的 gRPC 服务器
pub struct GrpcServer {
    registry: Arc<dyn RegistryClient>,
    group: String,
    ip: String,
    config: ServerConfig,
    routes: RoutesBuilder,
    services: Vec<String>,
}

impl GrpcServer {
    /// 连接注册中心并探测本机 IPv4 地址，任一失败都直接返回错误
    pub fn new(registry_address: &str, group: &str) -> Result<Self> {
        let registry = Arc::new(ConsulClient::new(registry_address)?);
        let ip = outbound_ipv4()?;
        Ok(Self::with_registry(
            registry,
            group,
            ip.to_string(),
            ServerConfig::default(),
        ))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = Arc::new(ConsulClient::new(&config.registry.address)?);
        let ip = match &config.server.advertise_address {
            Some(address) if !address.trim().is_empty() => address.trim().to_string(),
            _ => outbound_ipv4()?.to_string(),
        };
        Ok(Self::with_registry(
            registry,
            &config.registry.group,
            ip,
            config.server.clone(),
        ))
    }

    /// 使用已有的注册中心客户端与公布地址构造
    pub fn with_registry(
        registry: Arc<dyn RegistryClient>,
        group: &str,
        ip: impl Into<String>,
        config: ServerConfig,
    ) -> Self {
        Self {
            registry,
            group: normalize_group(group),
            ip: ip.into(),
            config,
            routes: RoutesBuilder::default(),
            services: Vec::new(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// 配置中的监听端口（`server.port`）
    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// 记录一个需要对外暴露的服务，注册推迟到 `serve`
    pub fn register_service<S>(&mut self, svc: S) -> &mut Self
    where
        S: Service<http::Request<Body>, Response = http::Response<Body>, Error = Infallible>
            + NamedService
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        self.services.push(S::NAME.to_string());
        self.routes.add_service(svc);
        self
    }

    /// 已记录的服务名
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// 在指定端口上的注册记录，每个服务一条
    pub fn records(&self, port: u16) -> Vec<RegistrationRecord> {
        self.services
            .iter()
            .map(|service| {
                RegistrationRecord::new(
                    service.as_str(),
                    self.group.as_str(),
                    self.ip.as_str(),
                    port,
                    self.config.weights.into(),
                    self.config.health_check.into(),
                )
            })
            .collect()
    }

    /// 在配置的端口上提供服务，直到收到 SIGINT/SIGTERM
    pub async fn serve_configured(self) -> Result<()> {
        self.serve_configured_with_shutdown(shutdown_signal()).await
    }

    /// 在配置的端口上提供服务，直到 `signal` 完成
    pub async fn serve_configured_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let port = self.port();
        self.serve_with_shutdown(port, signal).await
    }

    /// 在 `port` 上提供服务，直到收到 SIGINT/SIGTERM
    pub async fn serve(self, port: u16) -> Result<()> {
        self.serve_with_shutdown(port, shutdown_signal()).await
    }

    /// 在 `port` 上提供服务，直到 `signal` 完成
    pub async fn serve_with_shutdown<F>(self, port: u16, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await?;
        self.serve_with_listener(listener, signal).await
    }

    /// 在已绑定的监听器上提供服务
    pub async fn serve_with_listener<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let local_addr = listener.local_addr()?;
        let records = self.records(local_addr.port());
        let Self {
            registry,
            config,
            mut routes,
            services,
            ..
        } = self;

        info!(
            address = %local_addr,
            services = ?services,
            "🚀 Starting gRPC server"
        );

        let (health, health_server) = HealthService::new();
        routes.add_service(health_server);

        let stop = CancellationToken::new();
        let server = Server::builder()
            .http2_keepalive_interval(Some(Duration::from_secs(config.keepalive_interval_secs)))
            .http2_keepalive_timeout(Some(Duration::from_secs(config.keepalive_timeout_secs)))
            .max_connection_age(Duration::from_secs(config.max_connection_age_secs))
            .add_routes(routes.routes())
            .serve_with_incoming_shutdown(
                TcpListenerStream::new(listener),
                stop.clone().cancelled_owned(),
            );
        let mut server_task = tokio::spawn(server);

        let check_addr = if local_addr.ip().is_unspecified() {
            SocketAddr::from((Ipv4Addr::LOCALHOST, local_addr.port()))
        } else {
            local_addr
        };
        if let Err(e) = wait_for_port(check_addr, READY_CHECK_TIMEOUT).await {
            warn!(address = %check_addr, error = %e, "Server readiness check failed");
        }

        register_all(registry.as_ref(), &records).await;
        health.set_serving(services.iter().cloned()).await;

        let early_exit = tokio::select! {
            _ = signal => {
                info!("Shutting down gRPC server");
                None
            }
            res = &mut server_task => Some(res),
        };

        let served = match early_exit {
            Some(res) => res,
            None => {
                health.set_not_serving(services.iter().cloned()).await;
                stop.cancel();
                server_task.await
            }
        };

        deregister_all(registry.as_ref(), &records).await;

        match served {
            Ok(Ok(())) => {
                info!(address = %local_addr, "gRPC server stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "gRPC server failed");
                Err(e.into())
            }
            Err(e) => Err(FlareError::system(format!("gRPC server task failed: {}", e))),
        }
    }
}

/// 注册失败只记录日志，已注册成功的服务照常对外提供
async fn register_all(registry: &dyn RegistryClient, records: &[RegistrationRecord]) {
    for record in records {
        match registry.service_register(record).await {
            Ok(()) => info!(
                service_id = %record.service_id,
                service = %record.service_name,
                "✅ Service registered"
            ),
            Err(e) => error!(
                service_id = %record.service_id,
                service = %record.service_name,
                error = %e,
                "Failed to register service"
            ),
        }
    }
}

async fn deregister_all(registry: &dyn RegistryClient, records: &[RegistrationRecord]) {
    for record in records {
        match registry.service_deregister(&record.service_id).await {
            Ok(()) => info!(service_id = %record.service_id, "Service deregistered"),
            Err(e) => warn!(
                service_id = %record.service_id,
                error = %e,
                "⚠️ Failed to deregister service"
            ),
        }
    }
}
