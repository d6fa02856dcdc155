use mc_rewind_proto::ProtoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewindError {
    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("chunk compression failed: {0}")]
    ChunkCompression(String),
}
