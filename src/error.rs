use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("frame `{frame_id}` reappears after another frame started")]
    NonContiguousFrame { frame_id: String },
    #[error("frame `{frame_id}`: {found} keypoint values do not form (x, y, confidence) triples")]
    KeypointArity { frame_id: String, found: usize },
    #[error("frame `{frame_id}`: box has negative extent")]
    NegativeExtent { frame_id: String },
    #[error("frame `{frame_id}`: expected {expected} keypoints per detection, found {found}")]
    MixedKeypointCount {
        frame_id: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Format Error: {0}")]
    Format(#[from] FormatError),
    #[error("no signer found: clip produced no tracks")]
    NoSignerFound,
    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
