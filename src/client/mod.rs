//! Query client tying genome indexes and methylomes together.
//!
//! The client resolves methylome names through a [`MethylomeSource`], so the
//! same aggregation pipeline serves both locally stored methylomes and ones
//! fetched from a remote server.

pub mod config;

use std::path::PathBuf;

use log::debug;
use rayon::prelude::*;

use crate::data_structs::{
    GenomicInterval,
    Level,
    LevelsMatrix,
    Query,
};
use crate::data_structs::typedef::PosType;
use crate::error::{
    MethdexError,
    Result,
};
use crate::index::GenomeIndex;
use crate::methylome::{
    Methylome,
    MethylomeData,
    MethylomeMetadata,
};
use crate::utils::THREAD_POOL;
pub use config::{
    Backend,
    ClientConfig,
};

/// Capability to resolve a methylome by name.
pub trait MethylomeSource {
    fn read_methylome(&self, name: &str) -> Result<Methylome>;
}

/// Methylome source backed by a local storage directory.
#[derive(Debug, Clone)]
pub struct LocalSource {
    directory: PathBuf,
}

impl LocalSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl MethylomeSource for LocalSource {
    fn read_methylome(&self, name: &str) -> Result<Methylome> {
        Methylome::read(&self.directory, name)
    }
}

/// Transfer of serialized methylomes from a remote endpoint. The payload is
/// the bincode encoding of a `(MethylomeMetadata, MethylomeData)` pair.
pub trait MethylomeTransport {
    fn fetch(&self, genome_name: &str, methylome_name: &str)
    -> Result<Vec<u8>>;
}

/// Methylome source that fetches serialized methylomes over a transport.
#[derive(Debug, Clone)]
pub struct RemoteSource<T> {
    transport:   T,
    genome_name: String,
}

impl<T: MethylomeTransport> RemoteSource<T> {
    pub fn new(
        transport: T,
        genome_name: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            genome_name: genome_name.into(),
        }
    }
}

impl<T: MethylomeTransport> MethylomeSource for RemoteSource<T> {
    fn read_methylome(&self, name: &str) -> Result<Methylome> {
        let payload = self.transport.fetch(&self.genome_name, name)?;
        let (meta, data): (MethylomeMetadata, MethylomeData) =
            bincode::deserialize(&payload)?;
        Methylome::from_parts(data, meta)
    }
}

/// Aggregates counts from a set of methylomes over the ranges of a query,
/// one matrix column per methylome.
pub fn aggregate_levels<E: Level>(
    query: &Query,
    methylomes: &[Methylome],
) -> LevelsMatrix<E> {
    let mut matrix = LevelsMatrix::new(query.len(), methylomes.len());
    THREAD_POOL.install(|| {
        matrix
            .par_columns_mut()
            .zip(methylomes.par_iter())
            .for_each(|(column, methylome)| {
                methylome.data().get_levels_into(query, column);
            });
    });
    matrix
}

/// High-level entry point for methylation level queries.
///
/// Holds the genome index of one reference genome and resolves methylome
/// names through its source, verifying each methylome against the index
/// before aggregating.
pub struct Client<S> {
    index:  GenomeIndex,
    source: S,
}

impl Client<LocalSource> {
    /// Opens a local client for one genome from a configuration.
    pub fn local(
        config: &ClientConfig,
        genome_name: &str,
    ) -> Result<Self> {
        let index = GenomeIndex::read(config.index_dir(), genome_name)?;
        let source = LocalSource::new(config.methylome_dir());
        Ok(Self { index, source })
    }
}

impl<S: MethylomeSource> Client<S> {
    /// Pairs an already loaded genome index with a methylome source.
    pub fn with_source(
        index: GenomeIndex,
        source: S,
    ) -> Self {
        Self { index, source }
    }

    pub fn index(&self) -> &GenomeIndex {
        &self.index
    }

    /// Resolves methylome names and verifies each against the client's
    /// genome index. Fails on the first name that is missing or was built
    /// against a different index.
    fn load_methylomes(
        &self,
        methylome_names: &[&str],
    ) -> Result<Vec<Methylome>> {
        methylome_names
            .iter()
            .map(|name| {
                let methylome = self.source.read_methylome(name)?;
                if !methylome.is_consistent_with_index(&self.index) {
                    return Err(MethdexError::MethylomeIndexMismatch(
                        name.to_string(),
                        self.index.meta().genome_name.clone(),
                    ));
                }
                Ok(methylome)
            })
            .collect()
    }

    /// Methylation levels over a set of genomic intervals.
    pub fn get_levels<E: Level>(
        &self,
        intervals: &[GenomicInterval],
        methylome_names: &[&str],
    ) -> Result<LevelsMatrix<E>> {
        let query = self.index.make_query(intervals)?;
        self.get_levels_for_query(&query, methylome_names)
    }

    /// Methylation levels over non-overlapping fixed-size bins.
    pub fn get_levels_bins<E: Level>(
        &self,
        bin_size: PosType,
        methylome_names: &[&str],
    ) -> Result<LevelsMatrix<E>> {
        let query = self.index.make_bins_query(bin_size)?;
        self.get_levels_for_query(&query, methylome_names)
    }

    /// Methylation levels over sliding windows.
    pub fn get_levels_windows<E: Level>(
        &self,
        window_size: PosType,
        window_step: PosType,
        methylome_names: &[&str],
    ) -> Result<LevelsMatrix<E>> {
        let query = self
            .index
            .make_windows_query(window_size, window_step)?;
        self.get_levels_for_query(&query, methylome_names)
    }

    /// Methylation levels for a pre-translated query.
    pub fn get_levels_for_query<E: Level>(
        &self,
        query: &Query,
        methylome_names: &[&str],
    ) -> Result<LevelsMatrix<E>> {
        let methylomes = self.load_methylomes(methylome_names)?;
        debug!(
            "aggregating {} ranges over {} methylomes",
            query.len(),
            methylomes.len()
        );
        Ok(aggregate_levels(query, &methylomes))
    }
}
