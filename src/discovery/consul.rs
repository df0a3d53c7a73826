//! 基于注册中心长轮询的地址解析器

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::address::{Address, ResolverState};
use super::resolver::{ClientConn, Resolver, ResolverBuilder};
use super::target::{DiscoveryTarget, Target};
use crate::config::ResolverConfig;
use crate::error::Result;
use crate::registry::{ConsulClient, HealthQuery, HealthQueryResult, RegistryClient};
use crate::retry::{BackoffPolicy, ExponentialBackoffPolicy};

/// Consul 解析器使用的 URI scheme
pub const CONSUL_SCHEME: &str = "consul";

/// Consul 解析器构建器
#[derive(Debug, Clone, Default)]
pub struct ConsulResolverBuilder {
    config: ResolverConfig,
}

impl ConsulResolverBuilder {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }
}

impl ResolverBuilder for ConsulResolverBuilder {
    fn scheme(&self) -> &'static str {
        CONSUL_SCHEME
    }

    fn build(&self, target: &Target, cc: Arc<dyn ClientConn>) -> Result<Box<dyn Resolver>> {
        let target = DiscoveryTarget::from_target(target)?;
        let client = ConsulClient::new(&target.registry_host)?;
        let backoff = ExponentialBackoffPolicy::from_config(&self.config);

        Ok(Box::new(ConsulResolver::start(
            Arc::new(client),
            target,
            cc,
            self.config.wait_time(),
            Arc::new(backoff),
        )))
    }
}

/// 注册中心地址解析器
///
/// 每个实例拥有唯一一个后台 watch 任务，`close` 或 drop 时取消
pub struct ConsulResolver {
    target: DiscoveryTarget,
    cancel: CancellationToken,
}

impl ConsulResolver {
    /// 启动 watch 任务（必须在 tokio 运行时内调用）
    pub fn start(
        client: Arc<dyn RegistryClient>,
        target: DiscoveryTarget,
        cc: Arc<dyn ClientConn>,
        wait_time: Duration,
        backoff: Arc<dyn BackoffPolicy>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let watcher = Watcher {
            client,
            target: target.clone(),
            cc,
            wait_time,
            backoff,
            last_index: Mutex::new(0),
            cancel: cancel.clone(),
        };
        tokio::spawn(watcher.run());

        Self { target, cancel }
    }

    pub fn target(&self) -> &DiscoveryTarget {
        &self.target
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Resolver for ConsulResolver {
    fn resolve_now(&self) {
        debug!(target = %self.target, "resolve_now ignored, watch loop is continuous");
    }

    fn close(&self) {
        if !self.cancel.is_cancelled() {
            info!(target = %self.target, "Closing resolver");
            self.cancel.cancel();
        }
    }
}

impl Drop for ConsulResolver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Watcher {
    client: Arc<dyn RegistryClient>,
    target: DiscoveryTarget,
    cc: Arc<dyn ClientConn>,
    wait_time: Duration,
    backoff: Arc<dyn BackoffPolicy>,
    /// 推送锁，同时保护 last_index
    last_index: Mutex<u64>,
    cancel: CancellationToken,
}

impl Watcher {
    async fn run(self) {
        info!(
            service = %self.target.service_name,
            group = %self.target.group,
            registry = %self.target.registry_host,
            "Starting registry watch"
        );

        let mut failures: usize = 0;
        loop {
            let query = HealthQuery {
                service_name: &self.target.service_name,
                group: &self.target.group,
                only_passing: true,
                wait_index: self.current_index(),
                wait_time: self.wait_time,
            };

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = self.client.health_service(query) => result,
            };

            match result {
                Ok(result) => {
                    failures = 0;
                    if let Err(e) = self.push(result) {
                        warn!(
                            service = %self.target.service_name,
                            error = %e,
                            "Connection manager rejected resolver state"
                        );
                    }
                }
                Err(e) => {
                    let delay = self.backoff.backoff_duration(failures);
                    failures = failures.saturating_add(1);
                    warn!(
                        service = %self.target.service_name,
                        group = %self.target.group,
                        attempt = failures,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Health query failed, retrying"
                    );
                    self.cc.report_error(&e);

                    if delay.is_zero() {
                        tokio::task::yield_now().await;
                    } else {
                        tokio::select! {
                            biased;
                            _ = self.cancel.cancelled() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
        }

        info!(service = %self.target.service_name, "Registry watch stopped");
    }

    fn current_index(&self) -> u64 {
        *self.last_index.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 在推送锁内更新索引并推送完整快照
    fn push(&self, result: HealthQueryResult) -> Result<()> {
        let mut last_index = self.last_index.lock().unwrap_or_else(|e| e.into_inner());
        if result.index < *last_index {
            warn!(
                service = %self.target.service_name,
                previous = *last_index,
                returned = result.index,
                "Registry index went backwards, keeping previous index"
            );
        }
        *last_index = (*last_index).max(result.index);

        let addresses: Vec<Address> = result
            .instances
            .into_iter()
            .map(|instance| {
                let address = Address::new(instance.address, instance.port)
                    .with_server_name(self.target.service_name.clone());
                match instance.passing_weight {
                    Some(weight) => address.with_weight(i64::from(weight)),
                    None => address,
                }
            })
            .collect();

        debug!(
            service = %self.target.service_name,
            index = *last_index,
            addresses = addresses.len(),
            "Pushing resolver state"
        );

        self.cc
            .update_state(ResolverState::new(addresses, *last_index))
    }
}
