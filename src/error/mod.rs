//! 错误处理模块
//!
//! 提供统一的错误类型、错误代码分类以及与 gRPC 状态码之间的转换

pub mod code;
pub mod conversions;
pub mod flare_error;
pub mod grpc;

pub use code::{ErrorCategory, ErrorCode};
pub use flare_error::{FlareError, Result};
pub use grpc::map_error_code_to_grpc;
