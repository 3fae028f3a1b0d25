//! Storage backends for the blob strings cache.

pub mod soft;
