use std::path::PathBuf;

use thiserror::Error;

use crate::data_structs::typedef::PosType;

/// Convenience alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, MethdexError>;

/// Errors produced by index construction, persistence and querying.
#[derive(Debug, Error)]
pub enum MethdexError {
    /// A persisted genome index or methylome could not be located.
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// The reference genome violates structural assumptions.
    #[error("malformed reference: {0}")]
    MalformedReference(String),

    /// Persisted index data fails a structural invariant.
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// Methylome site counts do not match the genome index they claim to
    /// describe.
    #[error("invalid methylome data")]
    InvalidMethylomeData,

    /// A methylome was built against a different genome index than the one
    /// serving the query.
    #[error("methylome {0} inconsistent with genome index {1}")]
    MethylomeIndexMismatch(String, String),

    /// An interval references a chromosome absent from the index.
    #[error("chrom name not found in index: {0}")]
    ChromosomeNotFound(String),

    /// An interval's start exceeds its stop.
    #[error("invalid interval: start {start} > stop {stop}")]
    InvalidInterval { start: PosType, stop: PosType },

    /// An interval extends past the end of its chromosome.
    #[error("interval past chrom end in index: stop {stop} > chrom size {size}")]
    IntervalPastChromEnd { stop: PosType, size: PosType },

    /// Array lengths disagree where identical lengths are required.
    #[error("size mismatch: {0} != {1}")]
    SizeMismatch(usize, usize),

    /// A genome or methylome name contains characters outside
    /// `[A-Za-z0-9_]`.
    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Bincode(#[from] bincode::Error),
}
