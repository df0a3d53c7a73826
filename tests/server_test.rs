//! 服务端注册生命周期测试

mod common;

use common::FakeRegistry;
use flare_grpc_discovery::config::{DEFAULT_GROUP, ServerConfig};
use flare_grpc_discovery::registry::RegistryClient;
use flare_grpc_discovery::server::{GrpcServer, first_non_loopback_ipv4, wait_for_port};
use std::convert::Infallible;
use std::future::{Ready, ready};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tonic::body::Body;
use tonic::server::NamedService;
use tonic_health::pb::HealthCheckRequest;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;
use tokio_test::assert_ok;
use tower::Service;

macro_rules! dummy_service {
    ($ty:ident, $name:literal) => {
        #[derive(Clone)]
        struct $ty;

        impl NamedService for $ty {
            const NAME: &'static str = $name;
        }

        impl Service<http::Request<Body>> for $ty {
            type Response = http::Response<Body>;
            type Error = Infallible;
            type Future = Ready<Result<Self::Response, Self::Error>>;

            fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
                Poll::Ready(Ok(()))
            }

            fn call(&mut self, _req: http::Request<Body>) -> Self::Future {
                ready(Ok(http::Response::new(Body::empty())))
            }
        }
    };
}

dummy_service!(EchoService, "test.Echo");
dummy_service!(GreeterService, "test.Greeter");

const ADVERTISED_IP: &str = "10.0.0.5";

fn server(registry: Arc<FakeRegistry>) -> GrpcServer {
    let registry: Arc<dyn RegistryClient> = registry;
    let mut server = GrpcServer::with_registry(registry, "", ADVERTISED_IP, ServerConfig::default());
    server
        .register_service(EchoService)
        .register_service(GreeterService);
    server
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[test]
fn records_use_group_address_and_port() {
    let server = server(Arc::new(FakeRegistry::new()));
    assert_eq!(server.group(), DEFAULT_GROUP);
    assert_eq!(server.services(), ["test.Echo", "test.Greeter"]);

    let records = server.records(9000);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].service_id, "DEFAULT_GROUP:test.Echo:10.0.0.5:9000");
    assert_eq!(records[1].service_id, "DEFAULT_GROUP:test.Greeter:10.0.0.5:9000");
    assert_eq!(records[0].check_target(), "10.0.0.5:9000");
    assert_eq!(records[0].weights.passing, 10);
    assert_eq!(records[0].weights.warning, 1);
    assert_eq!(records[0].health_check.interval, Duration::from_secs(2));
    assert_eq!(records[0].health_check.timeout, Duration::from_secs(6));
    assert_eq!(records[0].health_check.deregister_after, Duration::from_secs(6));
}

#[test]
fn register_service_does_not_contact_registry() {
    let registry = Arc::new(FakeRegistry::new());
    let _server = server(registry.clone());
    assert!(registry.registered().is_empty());
}

#[tokio::test]
async fn shutdown_deregisters_each_service_once() {
    let registry = Arc::new(FakeRegistry::new());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(server(registry.clone()).serve_with_listener(listener, async move {
        let _ = rx.await;
    }));

    wait_until(|| registry.registered().len() == 2).await;
    let mut ids: Vec<String> = registry
        .registered()
        .into_iter()
        .map(|r| r.service_id)
        .collect();
    ids.sort();
    assert!(registry.deregistered().is_empty());
    assert_ok!(TcpStream::connect(addr).await);

    tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());

    let mut deregistered = registry.deregistered();
    deregistered.sort();
    assert_eq!(deregistered, ids);
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn registration_failure_is_not_fatal() {
    let registry = Arc::new(FakeRegistry::new());
    registry.fail_registration_of("test.Greeter");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(server(registry.clone()).serve_with_listener(listener, async move {
        let _ = rx.await;
    }));

    wait_until(|| registry.registered().len() == 1).await;
    assert_eq!(registry.registered()[0].service_name, "test.Echo");
    assert_ok!(TcpStream::connect(addr).await);

    tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());
    assert_eq!(registry.deregistered().len(), 2);
}

#[tokio::test]
async fn health_service_reports_serving() {
    let registry = Arc::new(FakeRegistry::new());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(server(registry.clone()).serve_with_listener(listener, async move {
        let _ = rx.await;
    }));
    wait_until(|| registry.registered().len() == 2).await;

    let channel = tonic::transport::Endpoint::from_shared(format!("http://{}", addr))
        .unwrap()
        .connect()
        .await
        .unwrap();
    let mut client = HealthClient::new(channel);

    let mut status = ServingStatus::Unknown as i32;
    for _ in 0..50 {
        let response = client
            .check(HealthCheckRequest {
                service: "test.Echo".to_string(),
            })
            .await;
        if let Ok(response) = response {
            status = response.into_inner().status;
            if status == ServingStatus::Serving as i32 {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, ServingStatus::Serving as i32);

    drop(client);
    tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());
}

#[test]
fn picks_first_non_loopback_ipv4() {
    let addrs: Vec<IpAddr> = vec![
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        "::1".parse().unwrap(),
        "fe80::1".parse().unwrap(),
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)),
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
    ];
    assert_eq!(
        first_non_loopback_ipv4(addrs),
        Some(Ipv4Addr::new(192, 168, 1, 10))
    );

    let loopback_only = vec![IpAddr::V4(Ipv4Addr::LOCALHOST), "::1".parse().unwrap()];
    assert_eq!(first_non_loopback_ipv4(loopback_only), None);
}

#[tokio::test]
async fn wait_for_port_times_out_on_closed_port() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);

    let result = wait_for_port(addr, Duration::from_millis(200)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn serve_configured_listens_on_configured_port() {
    let port = {
        let listener = TcpListener::bind("0.0.0.0:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ServerConfig {
        port,
        ..ServerConfig::default()
    };
    let registry = Arc::new(FakeRegistry::new());
    let dyn_registry: Arc<dyn RegistryClient> = registry.clone();
    let mut server = GrpcServer::with_registry(dyn_registry, "", ADVERTISED_IP, config);
    server.register_service(EchoService);
    assert_eq!(server.port(), port);

    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_configured_with_shutdown(async move {
        let _ = rx.await;
    }));

    wait_until(|| registry.registered().len() == 1).await;
    assert_eq!(
        registry.registered()[0].service_id,
        format!("DEFAULT_GROUP:test.Echo:{ADVERTISED_IP}:{port}")
    );
    assert_ok!(TcpStream::connect(("127.0.0.1", port)).await);

    tx.send(()).unwrap();
    assert_ok!(handle.await.unwrap());
    assert_eq!(registry.deregistered().len(), 1);
}
