pub mod shard;

pub use shard::ChunkSelector;
