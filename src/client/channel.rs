//! 负载均衡 Channel
//!
//! `BalancedChannel` 是解析器的连接管理器：每收到一次解析器快照，就按地址复用或新建
//! 底层 `tonic` Channel。每个地址有一个后台任务轮询 `grpc.health.v1` 检查，只有检查
//! 通过的地址才进入 [`PickerBuilder`] 构建的 picker。它实现了 `tower::Service`，
//! 可以直接交给 tonic 生成的客户端使用。

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tonic::body::Body;
use tonic::transport::{Channel, Endpoint};
use tonic_health::pb::HealthCheckRequest;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;
use tower::{BoxError, Service, ServiceExt};
use tracing::{debug, info, warn};

use super::options::DialOptions;
use crate::balancer::{ErrPicker, Picker, PickerBuilder};
use crate::discovery::{Address, ClientConn, Resolver, ResolverState};
use crate::error::{FlareError, Result};
use crate::retry::{BackoffPolicy, ExponentialBackoffPolicy};

/// 一个已解析的后端：地址与对应的连接
#[derive(Debug, Clone)]
pub struct Backend {
    address: Address,
    channel: Channel,
}

impl Backend {
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn into_channel(self) -> Channel {
        self.channel
    }
}

struct SubConn {
    backend: Backend,
    ready: bool,
    /// 取消该地址的健康检查任务
    cancel: CancellationToken,
}

#[derive(Default)]
struct ConnState {
    /// 最近一次解析结果中的地址顺序
    order: Vec<String>,
    sub_conns: HashMap<String, SubConn>,
}

/// 连接管理器内部状态
pub(crate) struct ConnManager {
    target: String,
    options: DialOptions,
    builder: PickerBuilder,
    me: Weak<ConnManager>,
    shutdown: CancellationToken,
    state: Mutex<ConnState>,
    picker: RwLock<Arc<dyn Picker<Backend>>>,
    /// 当前就绪的后端数量
    ready_tx: watch::Sender<usize>,
}

impl ConnManager {
    pub(crate) fn new(target: impl Into<String>, options: DialOptions) -> Arc<Self> {
        let (ready_tx, _) = watch::channel(0);
        let builder = PickerBuilder::new().with_max_weight(options.max_weight);
        let target = target.into();
        Arc::new_cyclic(|me| Self {
            target,
            options,
            builder,
            me: me.clone(),
            shutdown: CancellationToken::new(),
            state: Mutex::new(ConnState::default()),
            picker: RwLock::new(Arc::new(ErrPicker::no_backend_available())),
            ready_tx,
        })
    }

    fn connect(&self, address: &Address) -> Result<Channel> {
        let mut endpoint = Endpoint::from_shared(address.to_grpc_uri())?
            .connect_timeout(self.options.connect_timeout)
            .tcp_nodelay(self.options.tcp_nodelay);
        if let Some(timeout) = self.options.request_timeout {
            endpoint = endpoint.timeout(timeout);
        }
        if let Some(interval) = self.options.keepalive_interval {
            endpoint = endpoint.http2_keep_alive_interval(interval);
        }
        if let Some(timeout) = self.options.keepalive_timeout {
            endpoint = endpoint.keep_alive_timeout(timeout);
        }
        Ok(endpoint.connect_lazy())
    }

    fn pick(&self) -> Result<Backend> {
        let picker = self
            .picker
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        picker.pick()
    }

    /// 用就绪的子连接（按解析顺序）重建 picker，并发布就绪数量
    fn rebuild_picker(&self, state: &ConnState) -> usize {
        let ready: Vec<(Backend, Address)> = state
            .order
            .iter()
            .filter_map(|key| state.sub_conns.get(key))
            .filter(|sub_conn| sub_conn.ready)
            .map(|sub_conn| (sub_conn.backend.clone(), sub_conn.backend.address.clone()))
            .collect();

        let picker = self.builder.build(&ready);
        *self.picker.write().unwrap_or_else(|e| e.into_inner()) = picker;
        self.ready_tx.send_replace(ready.len());
        ready.len()
    }

    fn set_ready(&self, key: &str, ready: bool) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let Some(sub_conn) = state.sub_conns.get_mut(key) else {
            return;
        };
        if sub_conn.ready == ready {
            return;
        }
        sub_conn.ready = ready;

        let backends = self.rebuild_picker(&state);
        if ready {
            info!(target = %self.target, address = %key, backends, "Backend became ready");
        } else {
            warn!(target = %self.target, address = %key, backends, "Backend is no longer ready");
        }
    }

    fn spawn_health_check(&self, key: String, channel: Channel, cancel: CancellationToken) {
        let manager = self.me.clone();
        let timeout = self.options.connect_timeout;
        let interval = self.options.health_check_interval;
        tokio::spawn(async move {
            let backoff = ExponentialBackoffPolicy::new(
                Duration::from_millis(100),
                interval.max(Duration::from_millis(100)),
                0.2,
            );
            let mut client = HealthClient::new(channel);
            let mut failures = 0usize;

            loop {
                let ready = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    ready = check_health(&mut client, timeout) => ready,
                };
                match manager.upgrade() {
                    Some(manager) => manager.set_ready(&key, ready),
                    None => return,
                }

                let delay = if ready {
                    failures = 0;
                    interval
                } else {
                    let delay = backoff.backoff_duration(failures);
                    failures = failures.saturating_add(1);
                    delay
                };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        });
    }
}

/// 一次 `grpc.health.v1` 整体状态检查
///
/// 返回 `SERVING` 或服务端未实现健康服务时视为就绪
async fn check_health(client: &mut HealthClient<Channel>, timeout: Duration) -> bool {
    let request = HealthCheckRequest {
        service: String::new(),
    };
    match tokio::time::timeout(timeout, client.check(request)).await {
        Ok(Ok(response)) => response.into_inner().status == ServingStatus::Serving as i32,
        Ok(Err(status)) if status.code() == tonic::Code::Unimplemented => true,
        Ok(Err(status)) => {
            debug!(code = ?status.code(), message = status.message(), "Health check failed");
            false
        }
        Err(_) => {
            debug!(?timeout, "Health check timed out");
            false
        }
    }
}

impl Drop for ConnManager {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl ClientConn for ConnManager {
    fn update_state(&self, state: ResolverState) -> Result<()> {
        let mut conns = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut previous = std::mem::take(&mut conns.sub_conns);
        let mut order = Vec::with_capacity(state.addresses.len());

        for address in state.addresses {
            let key = address.addr();
            if conns.sub_conns.contains_key(&key) {
                warn!(target = %self.target, address = %key, "Duplicate address in resolver state, ignoring");
                continue;
            }
            let sub_conn = match previous.remove(&key) {
                Some(mut sub_conn) => {
                    sub_conn.backend.address = address;
                    sub_conn
                }
                None => match self.connect(&address) {
                    Ok(channel) => {
                        let cancel = self.shutdown.child_token();
                        self.spawn_health_check(key.clone(), channel.clone(), cancel.clone());
                        SubConn {
                            backend: Backend { address, channel },
                            ready: false,
                            cancel,
                        }
                    }
                    Err(e) => {
                        warn!(target = %self.target, address = %key, error = %e, "Failed to create channel");
                        continue;
                    }
                },
            };
            order.push(key.clone());
            conns.sub_conns.insert(key, sub_conn);
        }

        let removed = previous.len();
        for sub_conn in previous.into_values() {
            sub_conn.cancel.cancel();
        }
        conns.order = order;
        let ready = self.rebuild_picker(&conns);

        info!(
            target = %self.target,
            index = state.consistency_index,
            addresses = conns.order.len(),
            ready,
            removed,
            "Resolver state applied"
        );
        Ok(())
    }

    fn report_error(&self, err: &FlareError) {
        warn!(target = %self.target, error = %err, "Resolver reported error");
    }
}

/// 解析器句柄，最后一个 `BalancedChannel` 释放时关闭解析器
struct ResolverHandle(Box<dyn Resolver>);

impl Drop for ResolverHandle {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// 带服务发现与加权轮询的 gRPC Channel
#[derive(Clone)]
pub struct BalancedChannel {
    manager: Arc<ConnManager>,
    resolver: Arc<ResolverHandle>,
}

impl BalancedChannel {
    pub(crate) fn new(manager: Arc<ConnManager>, resolver: Box<dyn Resolver>) -> Self {
        Self {
            manager,
            resolver: Arc::new(ResolverHandle(resolver)),
        }
    }

    pub fn target(&self) -> &str {
        &self.manager.target
    }

    /// 从当前 picker 中选择一个就绪后端
    pub fn pick_backend(&self) -> Result<Backend> {
        self.manager.pick()
    }

    /// 从当前 picker 中选择一个连接
    pub fn pick(&self) -> Result<Channel> {
        self.pick_backend().map(Backend::into_channel)
    }

    /// 当前就绪的后端数量
    pub fn backend_count(&self) -> usize {
        *self.manager.ready_tx.borrow()
    }

    /// 等待至少一个后端就绪
    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let mut rx = self.manager.ready_tx.subscribe();
        match tokio::time::timeout(timeout, rx.wait_for(|count| *count > 0)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(FlareError::connection_failed(format!(
                "connection manager for {} closed",
                self.manager.target
            ))),
            Err(_) => Err(FlareError::connection_timeout(format!(
                "no backend for {} became available within {:?}",
                self.manager.target, timeout
            ))),
        }
    }

    pub fn resolve_now(&self) {
        self.resolver.0.resolve_now();
    }

    /// 停止解析器；已有的 picker 保持可用
    pub fn close(&self) {
        self.resolver.0.close();
    }
}

impl Service<http::Request<Body>> for BalancedChannel {
    type Response = <Channel as Service<http::Request<Body>>>::Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<Body>) -> Self::Future {
        match self.pick() {
            Ok(channel) => Box::pin(async move { channel.oneshot(req).await.map_err(BoxError::from) }),
            Err(err) => {
                let status: tonic::Status = err.into();
                Box::pin(async move { Err(BoxError::from(status)) })
            }
        }
    }
}
