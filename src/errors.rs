#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("content thread is no longer running")]
    ContentThreadGone,

    #[error("render surface error: {0}")]
    Render(#[from] anyhow::Error),
}
