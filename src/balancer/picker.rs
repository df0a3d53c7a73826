//! 加权轮询 picker

use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::discovery::Address;
use crate::error::{FlareError, Result};

/// 加权轮询负载均衡策略名称
pub const WEIGHTED_ROUND_ROBIN: &str = "weighted_round_robin";

/// 为每次调用选择一个后端连接
pub trait Picker<C>: Send + Sync {
    fn pick(&self) -> Result<C>;
}

/// 每次选择都返回同一个错误的 picker
#[derive(Debug, Clone)]
pub struct ErrPicker {
    err: FlareError,
}

impl ErrPicker {
    pub fn new(err: FlareError) -> Self {
        Self { err }
    }

    /// 没有就绪连接时使用
    pub fn no_backend_available() -> Self {
        Self::new(FlareError::no_backend_available())
    }
}

impl<C> Picker<C> for ErrPicker {
    fn pick(&self) -> Result<C> {
        Err(self.err.clone())
    }
}

/// 加权轮询 picker
///
/// 构建时把每个就绪连接按权重重复展开为选择列表，列表在 picker 生命周期内不可变；
/// 游标起点随机，避免每次拓扑变化重建 picker 时都从第一个地址开始。
#[derive(Debug)]
pub struct WeightedPicker<C> {
    sub_conns: Vec<C>,
    next: AtomicUsize,
}

impl<C: Clone> WeightedPicker<C> {
    /// 就绪集合为空时返回 `None`
    ///
    /// 选择列表长度等于权重之和，每次重建都会克隆同样多份连接句柄。
    /// 注册中心可能下发很大的权重时，用 [`WeightedPicker::with_max_weight`] 设置上限。
    pub fn new(ready: &[(C, Address)]) -> Option<Self> {
        Self::with_max_weight(ready, None)
    }

    /// 同 [`WeightedPicker::new`]，但每个连接的权重不超过 `max_weight`
    pub fn with_max_weight(ready: &[(C, Address)], max_weight: Option<u32>) -> Option<Self> {
        let cap = max_weight.map_or(u32::MAX, |max| max.max(1));
        let sub_conns: Vec<C> = ready
            .iter()
            .flat_map(|(conn, address)| {
                std::iter::repeat_n(conn, address.weight().min(cap) as usize)
            })
            .cloned()
            .collect();
        if sub_conns.is_empty() {
            return None;
        }

        let start = rand::thread_rng().gen_range(0..sub_conns.len());
        Some(Self {
            sub_conns,
            next: AtomicUsize::new(start),
        })
    }

    /// 选择列表长度（各连接权重之和）
    pub fn len(&self) -> usize {
        self.sub_conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_conns.is_empty()
    }
}

impl<C> Picker<C> for WeightedPicker<C>
where
    C: Clone + Send + Sync,
{
    fn pick(&self) -> Result<C> {
        let len = self.sub_conns.len();
        let index = self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| Some((n + 1) % len))
            .unwrap_or_else(|n| n);
        Ok(self.sub_conns[index].clone())
    }
}

/// picker 构建器
#[derive(Debug, Clone, Copy, Default)]
pub struct PickerBuilder {
    max_weight: Option<u32>,
}

impl PickerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 限制单个连接的权重，默认不限制
    pub fn with_max_weight(mut self, max_weight: Option<u32>) -> Self {
        self.max_weight = max_weight;
        self
    }

    pub fn name(&self) -> &'static str {
        WEIGHTED_ROUND_ROBIN
    }

    /// 按当前就绪连接（保持解析器给出的顺序）构建 picker
    pub fn build<C>(&self, ready: &[(C, Address)]) -> Arc<dyn Picker<C>>
    where
        C: Clone + Send + Sync + 'static,
    {
        match WeightedPicker::with_max_weight(ready, self.max_weight) {
            Some(picker) => Arc::new(picker),
            None => Arc::new(ErrPicker::no_backend_available()),
        }
    }
}
