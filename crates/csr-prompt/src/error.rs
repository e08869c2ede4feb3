use thiserror::Error;

/// Errors issuing a prompt request to the UI helper.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("connecting to prompt helper socket: {0}")]
    Connect(std::io::Error),

    #[error(transparent)]
    Wire(#[from] csr_wire::WireError),
}

pub type Result<T> = std::result::Result<T, PromptError>;
