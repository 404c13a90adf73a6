use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PrecipError {
    #[error("failed to read input table at {0}")]
    InputRead(Utf8PathBuf),

    #[error("malformed input row {line}: {message}")]
    MalformedRow { line: usize, message: String },

    #[error("invalid collection date: {0}")]
    InvalidCollectionDate(String),

    #[error("invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("invalid taxon name: {0:?}")]
    InvalidTaxonName(String),

    #[error("archive request failed: {0}")]
    ArchiveHttp(String),

    #[error("archive returned status {status}: {message}")]
    ArchiveStatus { status: u16, message: String },

    #[error("failed to decode archive response: {0}")]
    ArchiveDecode(String),

    #[error("failed to append output row: {0}")]
    OutputAppend(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
