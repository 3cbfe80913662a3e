//! Store executor implementations.
//!
//! ## Module Structure
//!
//! - `redis` - shared Redis backend used across the fleet
//! - `memory` - in-process backend for single-instance mode and tests

pub mod memory;
pub mod redis;

pub use self::memory::MemoryExecutor;
pub use self::redis::RedisPool;
