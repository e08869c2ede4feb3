//! Event loop: single-thread readiness multiplexing over the three
//! bound endpoints, idle-timeout shutdown, and per-connection dispatch.
//!
//! Each accepted connection is handed its own tokio task so one client's
//! blocking-from-the-worker's-view scan doesn't stall another's requests;
//! the loop itself only multiplexes `accept()`s and the idle timer, even
//! though tokio schedules the spawned tasks across its own thread pool.

use std::time::Duration;

use tracing::{debug, info, warn};

use csr_core::{Endpoint, PeerCredentials};
use csr_wire::WireError;

use crate::dispatcher::{self, AppState};
use crate::socket::BoundEndpoint;

/// Runs the accept loop until idle shutdown: if nothing becomes
/// ready within `idle_timeout` *and* the worker pool has no running or
/// queued task, the loop exits so the supervising init system can restart
/// the process on the next connect. Any accept rearms the timer.
pub async fn run(state: AppState, endpoints: Vec<BoundEndpoint>, idle_timeout: Duration) {
    loop {
        let accept = accept_any(&endpoints);
        match tokio::time::timeout(idle_timeout, accept).await {
            Ok(Ok((endpoint, stream))) => {
                let state = state.clone();
                tokio::spawn(async move {
                    handle_connection(state, endpoint, stream).await;
                });
            }
            Ok(Err(e)) => {
                warn!(error = %e, "accept failed");
            }
            Err(_elapsed) => {
                let status = state.pool.status();
                if status.is_idle() {
                    info!(?status, "idle timeout with no running work, shutting down");
                    break;
                }
                debug!(?status, "idle timeout but a job is running, rearming");
            }
        }
    }
}

async fn accept_any(endpoints: &[BoundEndpoint]) -> std::io::Result<(Endpoint, tokio::net::UnixStream)> {
    // `select_all`-style fan-in over a fixed, small set of listeners;
    // written as an explicit `select!` since the set never changes size.
    let [a, b, c]: [&BoundEndpoint; 3] = [&endpoints[0], &endpoints[1], &endpoints[2]];
    tokio::select! {
        res = a.listener.accept() => res.map(|(s, _)| (a.endpoint, s)),
        res = b.listener.accept() => res.map(|(s, _)| (b.endpoint, s)),
        res = c.listener.accept() => res.map(|(s, _)| (c.endpoint, s)),
    }
}

/// Serves one connection: retrieves peer credentials once, then dispatches
/// requests one at a time until the peer disconnects or a framing error
/// ends the connection. One request is processed at a time per
/// connection — there is no pipelining, so the client must serialize.
async fn handle_connection(state: AppState, endpoint: Endpoint, stream: tokio::net::UnixStream) {
    let creds = match crate::peer::credentials_of(&stream) {
        Ok(creds) => creds,
        Err(e) => {
            warn!(error = %e, "failed to read peer credentials, dropping connection");
            return;
        }
    };
    debug!(?endpoint, uid = creds.uid, pid = creds.pid, "accepted connection");

    let (mut reader, mut writer) = stream.into_split();
    loop {
        match dispatcher::dispatch(&state, endpoint, creds, &mut reader, &mut writer).await {
            Ok(()) => {}
            Err(WireError::Io(e)) if is_peer_close(&e) => {
                debug!(?endpoint, uid = creds.uid, "peer closed connection");
                break;
            }
            Err(e) => {
                debug!(?endpoint, uid = creds.uid, error = %e, "ending connection after framing error");
                break;
            }
        }
    }
}

fn is_peer_close(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::BrokenPipe
    )
}
