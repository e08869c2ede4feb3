//! Bounded elastic thread pool used by `csr-core` to run scan jobs
//! off the socket event loop's I/O thread.

mod pool;
mod status;

pub use pool::{Pool, PoolConfig};
pub use status::PoolStatus;
