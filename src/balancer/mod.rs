//! 负载均衡模块
//!
//! 根据当前就绪的连接构建不可变的加权轮询 picker

pub mod picker;

pub use picker::{ErrPicker, Picker, PickerBuilder, WEIGHTED_ROUND_ROBIN, WeightedPicker};
