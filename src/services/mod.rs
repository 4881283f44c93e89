// Service exports
pub mod pools;

pub use pools::{LoadError, PoolData, PoolLoader};
