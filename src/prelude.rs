//! Commonly used types, re-exported for glob import.

pub use crate::client::{
    aggregate_levels,
    Backend,
    Client,
    ClientConfig,
    LocalSource,
    MethylomeSource,
    MethylomeTransport,
    RemoteSource,
};
pub use crate::data_structs::typedef::{
    AggCountType,
    CountType,
    DensityType,
    PosType,
};
pub use crate::data_structs::{
    bin_intervals,
    window_intervals,
    GenomicInterval,
    Level,
    LevelElement,
    LevelElementCovered,
    LevelsMatrix,
    Query,
    QueryRange,
    SiteCounts,
};
pub use crate::error::{
    MethdexError,
    Result,
};
pub use crate::index::{
    GenomeIndex,
    GenomeIndexData,
    GenomeIndexMetadata,
};
pub use crate::methylome::{
    Methylome,
    MethylomeData,
    MethylomeMetadata,
};
