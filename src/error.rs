use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid choice: {0}")]
    InvalidChoice(String),

    #[error("Input closed before a valid answer was given")]
    InputClosed,

    #[error("Could not run {0}; is it installed and on PATH?")]
    ToolNotFound(String),

    #[error("Failed to read video info: {0}")]
    ProbeFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("No tag format for .{0} files")]
    TaggingUnsupported(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tag error: {0}")]
    Tag(#[from] id3::Error),

    #[error("FLAC tag error: {0}")]
    Flac(#[from] metaflac::Error),

    #[error("MP4 tag error: {0}")]
    Mp4(#[from] mp4ameta::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
