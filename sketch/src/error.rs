use thiserror::Error;

#[derive(Debug, Error)]
pub enum SketchError {
    #[error("Histogram creation error: {0}")]
    Creation(#[from] hdrhistogram::CreationError),
}
