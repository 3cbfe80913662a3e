//! Configuration models

mod server;
mod storage;

pub use server::ServerConfig;
pub use storage::RedisConfig;

pub(crate) fn default_connection_timeout() -> u64 {
    5
}
