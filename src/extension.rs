//! 解析器扩展注册表
//!
//! 进程初始化时显式调用 [`init`] 注册内置解析器；重复调用与重复注册都是无害的。

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Once, RwLock};
use tracing::{debug, info};

use crate::discovery::{ConsulResolverBuilder, PassthroughResolverBuilder, ResolverBuilder};

static RESOLVER_BUILDERS: LazyLock<RwLock<HashMap<String, Arc<dyn ResolverBuilder>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

static INIT: Once = Once::new();

/// 注册内置解析器（consul、passthrough），只执行一次
pub fn init() {
    INIT.call_once(|| {
        register_resolver(Arc::new(ConsulResolverBuilder::default()));
        register_resolver(Arc::new(PassthroughResolverBuilder));
        info!("Built-in resolvers registered");
    });
}

/// 按 scheme 注册解析器构建器
///
/// 同一 scheme 已注册时保持原有构建器并返回 `false`
pub fn register_resolver(builder: Arc<dyn ResolverBuilder>) -> bool {
    let scheme = builder.scheme().to_ascii_lowercase();
    let mut builders = RESOLVER_BUILDERS.write().unwrap_or_else(|e| e.into_inner());
    if builders.contains_key(&scheme) {
        debug!(scheme = %scheme, "Resolver already registered, ignoring");
        return false;
    }
    builders.insert(scheme.clone(), builder);
    debug!(scheme = %scheme, "Resolver registered");
    true
}

/// 查找 scheme 对应的解析器构建器
pub fn get_resolver(scheme: &str) -> Option<Arc<dyn ResolverBuilder>> {
    let builders = RESOLVER_BUILDERS.read().unwrap_or_else(|e| e.into_inner());
    builders.get(&scheme.to_ascii_lowercase()).cloned()
}
