//! 直连解析器：目标本身就是 `host:port`

use std::sync::Arc;

use super::address::{Address, ResolverState};
use super::resolver::{ClientConn, Resolver, ResolverBuilder};
use super::target::Target;
use crate::error::{FlareError, Result};

pub const PASSTHROUGH_SCHEME: &str = "passthrough";

#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughResolverBuilder;

impl ResolverBuilder for PassthroughResolverBuilder {
    fn scheme(&self) -> &'static str {
        PASSTHROUGH_SCHEME
    }

    fn build(&self, target: &Target, cc: Arc<dyn ClientConn>) -> Result<Box<dyn Resolver>> {
        let authority: http::uri::Authority = target
            .authority
            .parse()
            .map_err(|_| FlareError::invalid_target(target.as_str(), "missing host"))?;
        let port = authority
            .port_u16()
            .ok_or_else(|| FlareError::invalid_target(target.as_str(), "missing port"))?;
        let host = authority.host().trim_start_matches('[').trim_end_matches(']');

        cc.update_state(ResolverState::new(vec![Address::new(host, port)], 0))?;
        Ok(Box::new(PassthroughResolver))
    }
}

/// 地址固定不变，无后台任务
pub struct PassthroughResolver;

impl Resolver for PassthroughResolver {
    fn resolve_now(&self) {}

    fn close(&self) {}
}
