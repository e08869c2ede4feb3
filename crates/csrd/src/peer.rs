//! Peer credential retrieval (C2 `SO_PEERCRED` analogue).
//!
//! Uses tokio's built-in `UnixStream::peer_cred()` rather than a hand-rolled
//! `getsockopt(SO_PEERCRED)` call — the "full" feature set already exposes
//! it, and a raw libc call would just duplicate what it does.

use csr_core::PeerCredentials;
use tokio::net::UnixStream;

pub fn credentials_of(stream: &UnixStream) -> std::io::Result<PeerCredentials> {
    let cred = stream.peer_cred()?;
    Ok(PeerCredentials {
        uid: cred.uid(),
        gid: cred.gid(),
        pid: cred.pid().unwrap_or(-1),
    })
}
