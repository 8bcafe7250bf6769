use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),

    #[error("codec failure: {0}")]
    Codec(String),

    #[error("columnar sink failure: {0}")]
    ColumnarSink(String),
}

pub type Result<T> = std::result::Result<T, EtlError>;
