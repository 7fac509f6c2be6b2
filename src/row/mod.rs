//! 数据点与 flat metrics 行之间的编解码

mod decoder;
mod encoder;

pub use decoder::*;
pub use encoder::*;
