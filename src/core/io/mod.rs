mod candle;
mod error;
mod market;

pub use candle::*;
pub use error::DataError;
pub use market::*;

pub mod write;
pub use write::*;
