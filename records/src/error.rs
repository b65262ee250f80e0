use std::io;

#[derive(thiserror::Error, Debug)]
pub enum RecordsError {
    #[error("could not write best times to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("could not encode best times: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, RecordsError>;
