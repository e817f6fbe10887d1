use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Reporter loop is no longer running")]
    ChannelClosed,

    #[error("Reporter task failed: {0}")]
    Join(#[from] JoinError),
}
