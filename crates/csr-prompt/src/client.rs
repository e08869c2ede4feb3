use std::path::{Path, PathBuf};

use csr_model::UserResponse;
use csr_wire::{read_frame, write_frame, Decoder};
use tokio::net::UnixStream;
use tracing::debug;

use crate::error::{PromptError, Result};
use crate::protocol::{decode_response, PromptRequest};

/// Client for the UI helper's prompt socket. One request, one response,
/// one connection — the helper is a separate, untrusted-free local
/// process that renders the dialog and reports back what the user
/// picked.
#[derive(Debug, Clone)]
pub struct PromptClient {
    socket_path: PathBuf,
}

impl PromptClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self { socket_path: socket_path.into() }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Issues one prompt request and awaits the user's decision.
    pub async fn request(&self, req: &PromptRequest) -> Result<UserResponse> {
        debug!(subject = %req.subject, "issuing prompt to UI helper");
        let mut stream = UnixStream::connect(&self.socket_path).await.map_err(PromptError::Connect)?;

        let payload = req.encode();
        write_frame(&mut stream, &payload).await?;

        let reply = read_frame(&mut stream).await?;
        let mut dec = Decoder::new(&reply);
        let response = decode_response(&mut dec)?;
        Ok(response)
    }

    /// Blocking variant for callers running on a plain `std::thread` (the
    /// scan worker pool), not inside a tokio task. Spins up a throwaway
    /// current-thread runtime for the one round trip.
    pub fn request_blocking(&self, req: &PromptRequest) -> Result<UserResponse> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()
            .expect("failed to start prompt client runtime");
        rt.block_on(self.request(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{decode_request, encode_response, PromptDomain};
    use csr_model::PromptScope;
    use tokio::net::UnixListener;

    #[tokio::test]
    async fn round_trips_through_a_real_socket() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("prompt.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();

        let server = tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            let payload = read_frame(&mut conn).await.unwrap();
            let mut dec = Decoder::new(&payload);
            let request = decode_request(&mut dec).unwrap();
            assert_eq!(request.subject, "/tmp/infected");

            let mut enc = csr_wire::Encoder::new();
            encode_response(&mut enc, UserResponse::Remove);
            write_frame(&mut conn, &enc.into_payload()).await.unwrap();
        });

        let client = PromptClient::new(&socket_path);
        let req = PromptRequest::new(PromptDomain::Content, PromptScope::Ask, "/tmp/infected", "malware detected");
        let response = client.request(&req).await.unwrap();

        server.await.unwrap();
        assert_eq!(response, UserResponse::Remove);
    }
}
