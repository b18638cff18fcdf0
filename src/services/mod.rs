pub mod buckets;
pub mod loader;
pub mod media;
pub mod mime;
pub mod resolver;
pub mod selection;
pub mod signing;
pub mod storage;
