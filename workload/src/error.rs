use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkloadError {
    #[error("No live records to pick a key from")]
    EmptyKeyspace,

    #[error("Queries need at least one indexable field")]
    NoIndexableFields,

    #[error("Too many indexable fields: {0}. Must be at most {max}", max = crate::MAX_INDEXABLE_FIELDS)]
    TooManyFields(usize),

    #[error("Invalid hot percentage: {0}. Must be between 1 and 100")]
    InvalidHotPercentage(u32),
}
