//! Library half of the `csrd` binary: the socket layer, event loop, and
//! server dispatcher (C2, C3, C13), split out from `main.rs` so
//! integration tests can drive a real `UnixListener`/`UnixStream` pair
//! against [`dispatcher::dispatch`] without spawning the whole process.

pub mod dispatcher;
pub mod eventloop;
pub mod job;
pub mod peer;
pub mod socket;
