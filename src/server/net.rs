//! 网络工具

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::error::{ErrorCode, FlareError, Result};
use crate::retry::{BackoffPolicy, ExponentialBackoffPolicy};

/// 枚举本机网卡，返回第一个非回环 IPv4 地址
pub fn outbound_ipv4() -> Result<Ipv4Addr> {
    let interfaces = if_addrs::get_if_addrs()?;
    first_non_loopback_ipv4(
        interfaces
            .iter()
            .filter(|iface| !iface.is_loopback())
            .map(|iface| iface.ip()),
    )
    .ok_or_else(|| {
        FlareError::localized(
            ErrorCode::NoNetworkInterface,
            "no non-loopback IPv4 address found",
        )
    })
}

/// 按枚举顺序选出第一个非回环 IPv4 地址
pub fn first_non_loopback_ipv4<I>(addrs: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = IpAddr>,
{
    addrs.into_iter().find_map(|ip| match ip {
        IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(v4),
        _ => None,
    })
}

/// 等待端口可以接受 TCP 连接
pub async fn wait_for_port(address: SocketAddr, total: Duration) -> Result<()> {
    let backoff = ExponentialBackoffPolicy::new(
        Duration::from_millis(50),
        Duration::from_millis(500),
        0.0,
    );
    let start = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;
        match timeout(Duration::from_millis(100), TcpStream::connect(address)).await {
            Ok(Ok(_)) => {
                debug!(
                    address = %address,
                    attempts = attempt,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Server is ready"
                );
                return Ok(());
            }
            Ok(Err(e)) => {
                debug!(address = %address, attempt, error = %e, "Connection attempt failed, retrying");
            }
            Err(_) => {
                debug!(address = %address, attempt, "Connection attempt timed out, retrying");
            }
        }

        if start.elapsed() >= total {
            return Err(FlareError::connection_timeout(format!(
                "server {} not ready after {:?}",
                address, total
            )));
        }
        sleep(backoff.backoff_duration(attempt - 1)).await;
    }
}
