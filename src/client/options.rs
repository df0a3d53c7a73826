//! 客户端拨号选项

use std::time::Duration;

/// 拨号选项
#[derive(Debug, Clone)]
pub struct DialOptions {
    /// 是否阻塞到第一批后端可用
    pub block: bool,
    /// 建连超时，同时也是阻塞拨号的最长等待时间
    pub connect_timeout: Duration,
    /// 单次请求超时
    pub request_timeout: Option<Duration>,
    pub tcp_nodelay: bool,
    pub keepalive_interval: Option<Duration>,
    pub keepalive_timeout: Option<Duration>,
    /// 后端就绪后 `grpc.health.v1` 检查的间隔；检查失败时按指数退避重试
    pub health_check_interval: Duration,
    /// 单个后端参与加权轮询的权重上限，默认不限制
    pub max_weight: Option<u32>,
}

impl Default for DialOptions {
    fn default() -> Self {
        Self {
            block: true,
            connect_timeout: Duration::from_secs(5),
            request_timeout: None,
            tcp_nodelay: true,
            keepalive_interval: Some(Duration::from_secs(30)),
            keepalive_timeout: Some(Duration::from_secs(10)),
            health_check_interval: Duration::from_secs(5),
            max_weight: None,
        }
    }
}

impl DialOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(mut self, block: bool) -> Self {
        self.block = block;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_keepalive(mut self, interval: Duration, timeout: Duration) -> Self {
        self.keepalive_interval = Some(interval);
        self.keepalive_timeout = Some(timeout);
        self
    }

    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    pub fn with_max_weight(mut self, max_weight: u32) -> Self {
        self.max_weight = Some(max_weight);
        self
    }
}
