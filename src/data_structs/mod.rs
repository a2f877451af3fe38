//! Fundamental data types: genomic intervals, CpG index queries and
//! methylation level aggregates.

pub mod interval;
pub mod levels;
pub mod query;
pub mod typedef;

pub use interval::{
    bin_intervals,
    window_intervals,
    GenomicInterval,
};
pub use levels::{
    Level,
    LevelElement,
    LevelElementCovered,
    LevelsMatrix,
    SiteCounts,
};
pub use query::{
    Query,
    QueryRange,
};
