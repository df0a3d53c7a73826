//! 错误代码和错误类别定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 错误代码枚举
///
/// 错误代码按类别分组，每个类别占用1000个代码范围：
/// - 1000-1999: 连接相关错误
/// - 6000-6999: 系统相关错误（注册中心、负载均衡）
/// - 7000-7999: 网络相关错误
/// - 8000-8999: 序列化相关错误
/// - 9000-9999: 通用错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ErrorCode {
    // ============================================================
    // 连接相关错误 (1000-1999)
    // ============================================================
    ConnectionFailed = 1000,
    ConnectionTimeout = 1001,

    // ============================================================
    // 系统相关错误 (6000-6999)
    // ============================================================
    InternalError = 6000,
    ServiceUnavailable = 6001,
    ConfigurationError = 6003,
    RegistryUnavailable = 6005,
    RegistrationFailed = 6006,
    NoBackendAvailable = 6007,

    // ============================================================
    // 网络相关错误 (7000-7999)
    // ============================================================
    NetworkTimeout = 7001,
    NoNetworkInterface = 7004,

    // ============================================================
    // 序列化相关错误 (8000-8999)
    // ============================================================
    DeserializationError = 8001,

    // ============================================================
    // 通用错误 (9000-9999)
    // ============================================================
    InvalidParameter = 9001,
    InvalidTarget = 9005,
    UnknownError = 9999,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    /// 获取错误代码的数字值
    #[inline]
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// 从数字值创建错误代码
    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            1000 => Some(ErrorCode::ConnectionFailed),
            1001 => Some(ErrorCode::ConnectionTimeout),
            6000 => Some(ErrorCode::InternalError),
            6001 => Some(ErrorCode::ServiceUnavailable),
            6003 => Some(ErrorCode::ConfigurationError),
            6005 => Some(ErrorCode::RegistryUnavailable),
            6006 => Some(ErrorCode::RegistrationFailed),
            6007 => Some(ErrorCode::NoBackendAvailable),
            7001 => Some(ErrorCode::NetworkTimeout),
            7004 => Some(ErrorCode::NoNetworkInterface),
            8001 => Some(ErrorCode::DeserializationError),
            9001 => Some(ErrorCode::InvalidParameter),
            9005 => Some(ErrorCode::InvalidTarget),
            9999 => Some(ErrorCode::UnknownError),
            _ => None,
        }
    }

    /// 获取错误代码的英文标识符
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
            ErrorCode::ConnectionTimeout => "CONNECTION_TIMEOUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::RegistryUnavailable => "REGISTRY_UNAVAILABLE",
            ErrorCode::RegistrationFailed => "REGISTRATION_FAILED",
            ErrorCode::NoBackendAvailable => "NO_BACKEND_AVAILABLE",
            ErrorCode::NetworkTimeout => "NETWORK_TIMEOUT",
            ErrorCode::NoNetworkInterface => "NO_NETWORK_INTERFACE",
            ErrorCode::DeserializationError => "DESERIALIZATION_ERROR",
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
            ErrorCode::InvalidTarget => "INVALID_TARGET",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// 获取错误代码的类别（用于错误分类）
    pub fn category(&self) -> ErrorCategory {
        match self.as_u32() {
            1000..=1999 => ErrorCategory::Connection,
            6000..=6999 => ErrorCategory::System,
            7000..=7999 => ErrorCategory::Network,
            8000..=8999 => ErrorCategory::Serialization,
            _ => ErrorCategory::General,
        }
    }

    /// 判断是否为可重试的错误
    ///
    /// `NoBackendAvailable` 属于瞬时错误：调用方应按常规 RPC 重试策略退避重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::ConnectionTimeout
                | ErrorCode::NetworkTimeout
                | ErrorCode::ServiceUnavailable
                | ErrorCode::RegistryUnavailable
                | ErrorCode::NoBackendAvailable
        )
    }
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Connection,
    System,
    Network,
    Serialization,
    General,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Connection => write!(f, "CONNECTION"),
            ErrorCategory::System => write!(f, "SYSTEM"),
            ErrorCategory::Network => write!(f, "NETWORK"),
            ErrorCategory::Serialization => write!(f, "SERIALIZATION"),
            ErrorCategory::General => write!(f, "GENERAL"),
        }
    }
}
