//! # methdex
//!
//! `methdex` is a Rust library for indexing genome-wide CpG methylation data
//! and answering methylation level queries over genomic intervals, fixed-size
//! bins and sliding windows.
//!
//! The library is built around three structures:
//!
//! * [`GenomeIndex`]: an ordered catalogue of CpG site positions per
//!   chromosome, built once from a reference genome. It defines a flat,
//!   genome-wide CpG index space and translates genomic coordinates into
//!   contiguous ranges of CpG indices via binary search.
//! * [`Methylome`]: a flat array of per-site methylated/total read counts,
//!   addressed by the same CpG index space, with persistence, consistency
//!   checking against an index, and replicate merging.
//! * [`Client`]: a query façade that runs the same translate-then-aggregate
//!   pipeline against methylomes read from the local filesystem or fetched
//!   from a remote source, producing a rows-by-columns [`LevelsMatrix`]
//!   (rows = queried regions, columns = methylomes).
//!
//! ## Example
//!
//! ```no_run
//! use methdex::prelude::*;
//!
//! fn main() -> methdex::Result<()> {
//!     let index = GenomeIndex::read("indexes", "hg38")?;
//!     let intervals = vec![index.meta().interval("chr1", 10_000, 20_000)?];
//!     let query = index.make_query(&intervals)?;
//!
//!     let methylome = Methylome::read("methylomes", "sample1")?;
//!     let levels: Vec<LevelElement> = methylome.get_levels(&query)?;
//!     for level in levels {
//!         println!("{}\t{}", level.n_meth, level.n_total);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Number of threads used for index building and multi-methylome aggregation
//! can be configured with the `METHDEX_NUM_THREADS` environment variable.
//!
//! [`GenomeIndex`]: crate::index::GenomeIndex
//! [`Methylome`]: crate::methylome::Methylome
//! [`Client`]: crate::client::Client
//! [`LevelsMatrix`]: crate::data_structs::LevelsMatrix

pub mod client;
pub mod data_structs;
pub mod error;
pub mod index;
pub mod methylome;
pub mod prelude;
pub mod utils;

pub use error::{
    MethdexError,
    Result,
};
