use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("invalid URL")]
    InvalidUrl,

    #[error("invalid video ID")]
    InvalidVideoId,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("page bytes are not valid UTF-8 HTML")]
    InvalidHtmlFormat,

    #[error("caption track bytes are not valid UTF-8 XML")]
    InvalidXmlFormat,

    #[error("no caption tracks in any embedded player response")]
    NoCaptionData,

    #[error("caption tracks exist but none produced a transcript")]
    NoTranscriptData,

    #[error("no embedded player response carried video details")]
    NoVideoInfo,

    /// Carries the raw block so the caller can show the offending markup.
    #[error("activity block could not be parsed: {reason}")]
    ActivityParse { block: String, reason: String },
}

pub type Result<T> = std::result::Result<T, TranscriptError>;
