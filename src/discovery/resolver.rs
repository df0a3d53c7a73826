//! 地址解析器抽象

use std::sync::Arc;

use super::address::ResolverState;
use super::target::Target;
use crate::error::{FlareError, Result};

/// 连接管理器
///
/// 解析器把每次得到的完整地址快照推送给它，由它负责打开/关闭连接并重建 picker
pub trait ClientConn: Send + Sync {
    /// 用新的快照整体替换当前地址集合
    fn update_state(&self, state: ResolverState) -> Result<()>;

    /// 解析器遇到错误时的通知（默认忽略）
    fn report_error(&self, _err: &FlareError) {}
}

/// 地址解析器
pub trait Resolver: Send + Sync {
    /// 请求立即重新解析；持续 watch 的解析器可以忽略
    fn resolve_now(&self);

    /// 停止解析器的后台任务
    fn close(&self);
}

/// 解析器构建器，按 URI scheme 注册
pub trait ResolverBuilder: Send + Sync {
    fn scheme(&self) -> &'static str;

    /// 构建并启动解析器；目标格式非法时立即返回错误且不启动任何后台任务
    fn build(&self, target: &Target, cc: Arc<dyn ClientConn>) -> Result<Box<dyn Resolver>>;
}
