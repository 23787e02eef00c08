mod activation;
mod code;
mod license;

pub use activation::*;
pub use code::*;
pub use license::*;
