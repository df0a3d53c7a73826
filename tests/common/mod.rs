//! 测试用的注册中心与连接管理器替身

#![allow(dead_code)]

use async_trait::async_trait;
use flare_grpc_discovery::discovery::{ClientConn, ResolverState};
use flare_grpc_discovery::error::{FlareError, Result};
use flare_grpc_discovery::registry::{
    HealthQuery, HealthQueryResult, HealthyInstance, RegistrationRecord, RegistryClient,
};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

pub fn instance(address: &str, port: u16, weight: Option<i32>) -> HealthyInstance {
    HealthyInstance {
        address: address.to_string(),
        port,
        passing_weight: weight,
    }
}

pub fn query_result(index: u64, instances: Vec<HealthyInstance>) -> HealthQueryResult {
    HealthQueryResult { instances, index }
}

/// 内存注册中心
///
/// 健康查询按脚本依次返回；脚本耗尽后，设置了 `idle` 则每隔 `idle_delay` 返回它，
/// 否则像长轮询一样一直阻塞。
#[derive(Default)]
pub struct FakeRegistry {
    script: Mutex<VecDeque<Result<HealthQueryResult>>>,
    idle: Option<HealthQueryResult>,
    idle_delay: Duration,
    wait_indexes: Mutex<Vec<u64>>,
    registered: Mutex<Vec<RegistrationRecord>>,
    deregistered: Mutex<Vec<String>>,
    failing_services: Mutex<HashSet<String>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(script: Vec<Result<HealthQueryResult>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn with_idle(mut self, result: HealthQueryResult, delay: Duration) -> Self {
        self.idle = Some(result);
        self.idle_delay = delay;
        self
    }

    pub fn fail_registration_of(&self, service_name: &str) {
        self.failing_services
            .lock()
            .unwrap()
            .insert(service_name.to_string());
    }

    pub fn query_count(&self) -> usize {
        self.wait_indexes.lock().unwrap().len()
    }

    pub fn wait_indexes(&self) -> Vec<u64> {
        self.wait_indexes.lock().unwrap().clone()
    }

    pub fn registered(&self) -> Vec<RegistrationRecord> {
        self.registered.lock().unwrap().clone()
    }

    pub fn deregistered(&self) -> Vec<String> {
        self.deregistered.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistryClient for FakeRegistry {
    async fn health_service(&self, query: HealthQuery<'_>) -> Result<HealthQueryResult> {
        assert!(query.only_passing);
        self.wait_indexes.lock().unwrap().push(query.wait_index);

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => match &self.idle {
                Some(result) => {
                    tokio::time::sleep(self.idle_delay).await;
                    Ok(result.clone())
                }
                None => std::future::pending().await,
            },
        }
    }

    async fn service_register(&self, record: &RegistrationRecord) -> Result<()> {
        if self
            .failing_services
            .lock()
            .unwrap()
            .contains(&record.service_name)
        {
            return Err(FlareError::registration_failed(format!(
                "rejected {}",
                record.service_id
            )));
        }
        self.registered.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn service_deregister(&self, service_id: &str) -> Result<()> {
        self.deregistered
            .lock()
            .unwrap()
            .push(service_id.to_string());
        Ok(())
    }
}

/// 把收到的每个快照转发到 channel 的连接管理器
pub struct RecordingConn {
    tx: mpsc::UnboundedSender<ResolverState>,
    errors: AtomicUsize,
}

impl RecordingConn {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ResolverState>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                errors: AtomicUsize::new(0),
            },
            rx,
        )
    }

    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }
}

impl ClientConn for RecordingConn {
    fn update_state(&self, state: ResolverState) -> Result<()> {
        let _ = self.tx.send(state);
        Ok(())
    }

    fn report_error(&self, _err: &FlareError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

/// 等待下一个快照，超时则测试失败
pub async fn next_state(rx: &mut mpsc::UnboundedReceiver<ResolverState>) -> ResolverState {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for resolver state")
        .expect("resolver state channel closed")
}
