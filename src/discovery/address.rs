//! 解析结果：地址与解析器状态

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 权重在地址属性中使用的键
pub const WEIGHT_KEY: &str = "weight";

/// 地址的带外属性
///
/// 从解析器推送到负载均衡器构建 picker 的整个过程中保持不变
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes(HashMap<String, serde_json::Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加属性
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 一个可连接的后端地址
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub host: String,
    pub port: u16,
    /// 目标服务名（解析器以服务名填充）
    pub server_name: String,
    pub attributes: Attributes,
}

impl Address {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            server_name: String::new(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = server_name.into();
        self
    }

    /// 设置权重属性（原样保存，读取时再归一化）
    pub fn with_weight(mut self, weight: i64) -> Self {
        self.attributes.insert(WEIGHT_KEY, weight);
        self
    }

    /// `host:port`，IPv6 地址加方括号
    pub fn addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// 转换为 gRPC URI
    pub fn to_grpc_uri(&self) -> String {
        format!("http://{}", self.addr())
    }

    /// 归一化后的权重：缺失、非整数或 ≤0 时为 1
    pub fn weight(&self) -> u32 {
        normalize_weight(self.attributes.get(WEIGHT_KEY).and_then(|v| v.as_i64()))
    }
}

/// 权重归一化：缺失或 ≤0 视为 1
pub fn normalize_weight(raw: Option<i64>) -> u32 {
    match raw {
        Some(w) if w > 0 => u32::try_from(w).unwrap_or(u32::MAX),
        _ => 1,
    }
}

/// 解析器推送给连接管理器的完整快照
///
/// 每次推送都整体替换上一次的状态，不做增量比较
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverState {
    pub addresses: Vec<Address>,
    /// 单调不减的一致性索引
    pub consistency_index: u64,
}

impl ResolverState {
    pub fn new(addresses: Vec<Address>, consistency_index: u64) -> Self {
        Self {
            addresses,
            consistency_index,
        }
    }
}
