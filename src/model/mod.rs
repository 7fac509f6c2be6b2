//! 数据点模型

mod point;

pub use point::*;
