//! Methylome stores: per-site read counts addressable by a genome index's
//! flat CpG index space, with persistence, consistency checks and merging.

pub mod data;
pub mod metadata;

use std::path::Path;

use log::debug;

use crate::data_structs::{
    Level,
    LevelElement,
    LevelElementCovered,
    Query,
};
use crate::error::{
    MethdexError,
    Result,
};
use crate::index::GenomeIndex;
pub use data::MethylomeData;
pub use metadata::MethylomeMetadata;

/// A methylome: per-site counts plus the metadata tying them to a genome
/// index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Methylome {
    data: MethylomeData,
    meta: MethylomeMetadata,
}

impl Methylome {
    pub fn data(&self) -> &MethylomeData {
        &self.data
    }

    pub fn meta(&self) -> &MethylomeMetadata {
        &self.meta
    }

    pub fn n_cpgs(&self) -> u32 {
        self.data.n_cpgs()
    }

    /// Assembles a methylome from raw counts and a pre-built metadata
    /// record, as received from a remote source.
    pub(crate) fn from_parts(
        data: MethylomeData,
        meta: MethylomeMetadata,
    ) -> Result<Self> {
        if data.n_cpgs() != meta.n_cpgs {
            return Err(MethdexError::InvalidMethylomeData);
        }
        Ok(Self { data, meta })
    }

    /// Creates a methylome from counts and stamps its metadata from the
    /// genome index it was built against.
    pub fn new(
        data: MethylomeData,
        index: &GenomeIndex,
    ) -> Result<Self> {
        let mut methylome = Self {
            data,
            meta: MethylomeMetadata::default(),
        };
        methylome.init_metadata(index)?;
        Ok(methylome)
    }

    /// Stamps the methylome with the identity of a genome index.
    ///
    /// Fails with [`MethdexError::InvalidMethylomeData`] when the site
    /// count does not match the index's total CpG count.
    pub fn init_metadata(
        &mut self,
        index: &GenomeIndex,
    ) -> Result<()> {
        if self.data.n_cpgs() != index.n_cpgs() {
            return Err(MethdexError::InvalidMethylomeData);
        }
        self.meta = MethylomeMetadata {
            version:        env!("CARGO_PKG_VERSION").to_string(),
            methylome_hash: self.data.hash()?,
            index_hash:     index.meta().index_hash,
            genome_name:    index.meta().genome_name.clone(),
            n_cpgs:         index.n_cpgs(),
        };
        Ok(())
    }

    /// Recomputes derived metadata fields from the raw site array. Valid on
    /// any well-formed store, including an empty one.
    pub fn update_metadata(&mut self) -> Result<()> {
        self.meta.methylome_hash = self.data.hash()?;
        self.meta.n_cpgs = self.data.n_cpgs();
        Ok(())
    }

    /// Merges another methylome's counts into this one.
    pub fn add(
        &mut self,
        other: &Methylome,
    ) -> Result<()> {
        self.data.add(&other.data)?;
        self.update_metadata()
    }

    /// Structural self-check: site count and data hash match the metadata.
    pub fn is_consistent(&self) -> bool {
        self.data.n_cpgs() == self.meta.n_cpgs
            && self
                .data
                .hash()
                .is_ok_and(|h| h == self.meta.methylome_hash)
    }

    /// Whether another methylome was built against the same genome index.
    pub fn is_consistent_with(
        &self,
        other: &Methylome,
    ) -> bool {
        self.data.n_cpgs() == other.data.n_cpgs()
            && self.meta.is_consistent_with(&other.meta)
    }

    /// Whether this methylome was built against the given genome index.
    pub fn is_consistent_with_index(
        &self,
        index: &GenomeIndex,
    ) -> bool {
        self.meta.index_hash == index.meta().index_hash
            && self.data.n_cpgs() == index.n_cpgs()
    }

    pub fn get_levels<E: Level>(
        &self,
        query: &Query,
    ) -> Result<Vec<E>> {
        self.data.get_levels(query)
    }

    pub fn global_levels(&self) -> LevelElement {
        self.data.global_levels()
    }

    pub fn global_levels_covered(&self) -> LevelElementCovered {
        self.data.global_levels_covered()
    }

    /// Loads a persisted methylome, checking the per-site invariant, the
    /// site count and the content hash against its metadata eagerly.
    pub fn read(
        directory: impl AsRef<Path>,
        name: &str,
    ) -> Result<Self> {
        let directory = directory.as_ref();
        let meta = MethylomeMetadata::read(
            &MethylomeMetadata::compose_filename(directory, name),
        )?;
        let data = MethylomeData::read(
            &MethylomeData::compose_filename(directory, name),
            meta.n_cpgs,
        )?;
        if data.hash()? != meta.methylome_hash {
            return Err(MethdexError::InvalidMethylomeData);
        }
        debug!("read methylome {} from {}", name, directory.display());
        Ok(Self { data, meta })
    }

    /// Persists the methylome as a metadata and a data file, both written
    /// via atomic rename.
    pub fn write(
        &self,
        directory: impl AsRef<Path>,
        name: &str,
    ) -> Result<()> {
        let directory = directory.as_ref();
        let data_path = MethylomeData::compose_filename(directory, name);
        let meta_path = MethylomeMetadata::compose_filename(directory, name);
        self.data.write(&data_path)?;
        if let Err(e) = self.meta.write(&meta_path) {
            let _ = std::fs::remove_file(&data_path);
            return Err(e);
        }
        Ok(())
    }

    /// Whether both persisted files of a named methylome exist.
    pub fn files_exist(
        directory: impl AsRef<Path>,
        name: &str,
    ) -> bool {
        let directory = directory.as_ref();
        MethylomeMetadata::compose_filename(directory, name).exists()
            && MethylomeData::compose_filename(directory, name).exists()
    }

    /// Names of all complete methylome file pairs in a directory, in stable
    /// sorted order.
    pub fn list_methylomes(
        directory: impl AsRef<Path>
    ) -> Result<Vec<String>> {
        let directory = directory.as_ref();
        let mut names = Vec::new();
        for entry in std::fs::read_dir(directory)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name
                .to_str()
                .and_then(|f| f.strip_suffix(metadata::FILENAME_EXTENSION))
            else {
                continue;
            };
            if MethylomeData::compose_filename(directory, name).exists() {
                names.push(name.to_string());
            }
        }
        names.sort_unstable();
        Ok(names)
    }

    /// Derives the methylome name from a persisted file name by stripping
    /// everything from the first dot.
    pub fn parse_methylome_name(filename: &Path) -> Result<String> {
        let name = filename
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| {
                MethdexError::InvalidName(filename.display().to_string())
            })?;
        let stem = name.split('.').next().unwrap_or(name);
        Ok(stem.to_string())
    }
}
