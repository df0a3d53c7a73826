//! 服务发现地址解析
//!
//! 地址格式：`scheme://registryHost[:port]/group/serviceName`

use std::fmt;
use std::str::FromStr;

use crate::error::{FlareError, Result};

/// 通用的拨号目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// URI scheme；`host:port` 形式的目标没有 scheme
    pub scheme: Option<String>,
    pub authority: String,
    pub path: String,
    raw: String,
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FlareError::invalid_target(raw, "empty target"));
        }
        let uri: http::Uri = trimmed
            .parse()
            .map_err(|e| FlareError::invalid_target(raw, format!("{}", e)))?;

        Ok(Self {
            scheme: uri.scheme_str().map(|s| s.to_ascii_lowercase()),
            authority: uri.authority().map(|a| a.to_string()).unwrap_or_default(),
            path: uri.path().to_string(),
            raw: trimmed.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// 注册中心服务发现目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryTarget {
    pub scheme: String,
    pub registry_host: String,
    pub group: String,
    pub service_name: String,
}

impl DiscoveryTarget {
    /// 从已解析的 [`Target`] 中提取注册中心地址、分组与服务名
    ///
    /// 路径必须恰好包含两个非空段：`/group/serviceName`
    pub fn from_target(target: &Target) -> Result<Self> {
        let scheme = target
            .scheme
            .clone()
            .ok_or_else(|| FlareError::invalid_target(target.as_str(), "missing scheme"))?;
        if target.authority.is_empty() {
            return Err(FlareError::invalid_target(target.as_str(), "missing registry host"));
        }

        let segments: Vec<&str> = target.path.trim_matches('/').split('/').collect();
        let (group, service_name) = match segments.as_slice() {
            [group, service] if !group.is_empty() && !service.is_empty() => (*group, *service),
            _ => {
                return Err(FlareError::invalid_target(
                    target.as_str(),
                    "path must be /group/serviceName",
                ));
            }
        };

        Ok(Self {
            scheme,
            registry_host: target.authority.clone(),
            group: group.to_string(),
            service_name: service_name.to_string(),
        })
    }
}

impl FromStr for DiscoveryTarget {
    type Err = FlareError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_target(&Target::parse(s)?)
    }
}

impl fmt::Display for DiscoveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}/{}/{}",
            self.scheme, self.registry_host, self.group, self.service_name
        )
    }
}
