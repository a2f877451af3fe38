use std::path::{
    Path,
    PathBuf,
};

use hashbrown::HashMap;
use serde::{
    Deserialize,
    Serialize,
};

use crate::data_structs::typedef::PosType;
use crate::data_structs::GenomicInterval;
use crate::error::{
    MethdexError,
    Result,
};
use crate::utils::atomic_write;

/// Extension of the metadata sidecar file of a persisted genome index.
pub const FILENAME_EXTENSION: &str = ".cpg_idx.json";

/// Chromosome table and summary counts of a genome index.
///
/// Chromosome ids are 0-based and contiguous, assigned in order of
/// appearance in the reference. `chrom_offsets` holds the exclusive prefix
/// sum of per-chromosome CpG counts: the global index of chromosome `i`'s
/// first CpG site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenomeIndexMetadata {
    pub version:       String,
    pub genome_name:   String,
    pub index_hash:    u64,
    pub n_cpgs:        u32,
    pub chrom_names:   Vec<String>,
    pub chrom_sizes:   Vec<PosType>,
    pub chrom_offsets: Vec<u32>,

    #[serde(skip)]
    chrom_ids: HashMap<String, u32>,
}

impl GenomeIndexMetadata {
    pub(crate) fn new(
        version: String,
        genome_name: String,
        index_hash: u64,
        n_cpgs: u32,
        chrom_names: Vec<String>,
        chrom_sizes: Vec<PosType>,
        chrom_offsets: Vec<u32>,
    ) -> Self {
        let mut meta = Self {
            version,
            genome_name,
            index_hash,
            n_cpgs,
            chrom_names,
            chrom_sizes,
            chrom_offsets,
            chrom_ids: HashMap::new(),
        };
        meta.init_lookup();
        meta
    }

    /// Rebuilds the name-to-id lookup; must run after deserialization.
    fn init_lookup(&mut self) {
        self.chrom_ids = self
            .chrom_names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id as u32))
            .collect();
    }

    pub fn n_chroms(&self) -> usize {
        self.chrom_names.len()
    }

    /// Resolves a chromosome name to its 0-based id.
    pub fn chrom_id(
        &self,
        name: &str,
    ) -> Result<u32> {
        self.chrom_ids
            .get(name)
            .copied()
            .ok_or_else(|| MethdexError::ChromosomeNotFound(name.to_string()))
    }

    pub fn chrom_name(
        &self,
        chrom_id: u32,
    ) -> Option<&str> {
        self.chrom_names
            .get(chrom_id as usize)
            .map(String::as_str)
    }

    /// Validated interval constructor resolving the chromosome by name.
    pub fn interval(
        &self,
        chrom_name: &str,
        start: PosType,
        stop: PosType,
    ) -> Result<GenomicInterval> {
        let chrom_id = self.chrom_id(chrom_name)?;
        if start > stop {
            return Err(MethdexError::InvalidInterval { start, stop });
        }
        let size = self.chrom_sizes[chrom_id as usize];
        if stop > size {
            return Err(MethdexError::IntervalPastChromEnd { stop, size });
        }
        Ok(GenomicInterval::new(chrom_id, start, stop))
    }

    /// Number of CpG sites in each chromosome, in id order.
    pub fn n_cpgs_per_chrom(&self) -> Vec<u32> {
        let n = self.chrom_offsets.len();
        (0..n)
            .map(|i| {
                let next = self
                    .chrom_offsets
                    .get(i + 1)
                    .copied()
                    .unwrap_or(self.n_cpgs);
                next - self.chrom_offsets[i]
            })
            .collect()
    }

    /// Number of fixed-size bins covering the whole genome.
    pub fn n_bins(
        &self,
        bin_size: PosType,
    ) -> u64 {
        assert!(bin_size > 0, "Bin size must be positive");
        self.chrom_sizes
            .iter()
            .map(|&size| size.div_ceil(bin_size) as u64)
            .sum()
    }

    /// Number of sliding windows covering the whole genome.
    pub fn n_windows(
        &self,
        window_step: PosType,
    ) -> u64 {
        assert!(window_step > 0, "Window step must be positive");
        self.chrom_sizes
            .iter()
            .map(|&size| size.div_ceil(window_step) as u64)
            .sum()
    }

    /// Checks the structural invariants of the chromosome table.
    pub fn validate(&self) -> Result<()> {
        if self.chrom_names.len() != self.chrom_sizes.len()
            || self.chrom_names.len() != self.chrom_offsets.len()
        {
            return Err(MethdexError::CorruptIndex(
                "chrom table column lengths differ".to_string(),
            ));
        }
        if self.chrom_ids.len() != self.chrom_names.len() {
            return Err(MethdexError::CorruptIndex(
                "duplicate chrom names".to_string(),
            ));
        }
        if let Some(&first) = self.chrom_offsets.first() {
            if first != 0 {
                return Err(MethdexError::CorruptIndex(
                    "first chrom offset is not zero".to_string(),
                ));
            }
        }
        let monotone = self
            .chrom_offsets
            .windows(2)
            .all(|w| w[0] <= w[1]);
        if !monotone {
            return Err(MethdexError::CorruptIndex(
                "chrom offsets are not nondecreasing".to_string(),
            ));
        }
        if self
            .chrom_offsets
            .last()
            .is_some_and(|&last| last > self.n_cpgs)
        {
            return Err(MethdexError::CorruptIndex(
                "chrom offsets exceed total CpG count".to_string(),
            ));
        }
        Ok(())
    }

    pub fn compose_filename(
        directory: &Path,
        name: &str,
    ) -> PathBuf {
        directory.join(format!("{}{}", name, FILENAME_EXTENSION))
    }

    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MethdexError::NotFound(path.to_path_buf()));
        }
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        let mut meta: Self = serde_json::from_reader(reader)?;
        meta.init_lookup();
        meta.validate()?;
        Ok(meta)
    }

    pub fn write(
        &self,
        path: &Path,
    ) -> Result<()> {
        atomic_write(path, |writer| {
            serde_json::to_writer_pretty(writer, self)?;
            Ok(())
        })
    }
}
