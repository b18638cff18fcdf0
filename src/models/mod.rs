mod media;
mod scope;
mod storage;

pub use media::*;
pub use scope::*;
pub use storage::*;
