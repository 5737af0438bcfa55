use thiserror::Error;

/// Top-level error type for the netmon platform.
#[derive(Error, Debug)]
pub enum NetmonError {
    #[error("Unknown role: {0}")]
    InvalidRole(String),
}
