#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session store unavailable: {0:#}")]
    Unavailable(#[from] anyhow::Error),
}
