//! 统一错误类型

use super::code::ErrorCode;
use thiserror::Error;

/// 服务发现与注册的统一错误类型
#[derive(Error, Debug, Clone)]
pub enum FlareError {
    /// 带错误代码的业务错误
    #[error("错误 [{code}] {reason}", code = .code.as_str())]
    Localized {
        code: ErrorCode,
        reason: String,
        details: Option<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// 系统错误（用于内部错误，不暴露给用户）
    #[error("系统错误: {0}")]
    System(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl FlareError {
    /// 创建带错误代码的错误
    pub fn localized(code: ErrorCode, reason: impl Into<String>) -> Self {
        FlareError::Localized {
            code,
            reason: reason.into(),
            details: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// 创建系统错误
    pub fn system(msg: impl Into<String>) -> Self {
        FlareError::System(msg.into())
    }

    /// 创建 IO 错误
    pub fn io(msg: impl Into<String>) -> Self {
        FlareError::Io(msg.into())
    }

    /// 附加错误详情（仅对 `Localized` 生效）
    #[must_use]
    pub fn with_details(self, details: impl Into<String>) -> Self {
        match self {
            FlareError::Localized {
                code,
                reason,
                timestamp,
                ..
            } => FlareError::Localized {
                code,
                reason,
                details: Some(details.into()),
                timestamp,
            },
            other => other,
        }
    }

    // ============================================================
    // 便捷方法：服务发现相关错误
    // ============================================================

    /// 没有可用的后端连接（瞬时错误，可重试）
    pub fn no_backend_available() -> Self {
        Self::localized(ErrorCode::NoBackendAvailable, "no backend available")
    }

    /// 非法的服务发现地址
    pub fn invalid_target(target: impl AsRef<str>, reason: impl Into<String>) -> Self {
        Self::localized(
            ErrorCode::InvalidTarget,
            format!("invalid discovery target '{}'", target.as_ref()),
        )
        .with_details(reason)
    }

    /// 注册中心请求失败
    pub fn registry(reason: impl Into<String>) -> Self {
        Self::localized(ErrorCode::RegistryUnavailable, reason)
    }

    /// 服务注册失败
    pub fn registration_failed(reason: impl Into<String>) -> Self {
        Self::localized(ErrorCode::RegistrationFailed, reason)
    }

    /// 创建连接失败错误
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        Self::localized(ErrorCode::ConnectionFailed, reason)
    }

    /// 创建连接超时错误
    pub fn connection_timeout(reason: impl Into<String>) -> Self {
        Self::localized(ErrorCode::ConnectionTimeout, reason)
    }

    /// 创建配置错误
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::localized(ErrorCode::ConfigurationError, reason)
    }

    /// 创建反序列化错误
    pub fn deserialization_error(reason: impl Into<String>) -> Self {
        Self::localized(ErrorCode::DeserializationError, reason)
    }

    // ============================================================
    // 信息获取方法
    // ============================================================

    /// 获取错误代码
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            FlareError::Localized { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// 获取错误原因
    pub fn reason(&self) -> &str {
        match self {
            FlareError::Localized { reason, .. } => reason,
            FlareError::System(msg) => msg,
            FlareError::Io(msg) => msg,
        }
    }

    /// 获取错误详情
    pub fn details(&self) -> Option<&str> {
        match self {
            FlareError::Localized { details, .. } => details.as_deref(),
            _ => None,
        }
    }

    /// 判断是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        self.code().map(|code| code.is_retryable()).unwrap_or(false)
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, FlareError>;
