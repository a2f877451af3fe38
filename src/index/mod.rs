//! The genome index: an ordered catalogue of CpG site positions per
//! chromosome, with persistence and the interval-to-CpG-range translator.

pub mod data;
pub mod metadata;

use std::path::Path;

use itertools::Itertools;
use log::{
    debug,
    info,
};
use rayon::prelude::*;

use crate::data_structs::typedef::PosType;
use crate::data_structs::{
    bin_intervals,
    window_intervals,
    GenomicInterval,
    Query,
};
use crate::error::{
    MethdexError,
    Result,
};
use crate::utils::{
    is_valid_name,
    THREAD_POOL,
};
pub use data::GenomeIndexData;
pub use metadata::GenomeIndexMetadata;

/// Recognized reference genome file suffixes, longest first so that
/// stripping is unambiguous.
const FASTA_SUFFIXES: &[&str] = &[
    ".fasta.gz",
    ".fasta",
    ".faa.gz",
    ".faa",
    ".fa.gz",
    ".fa",
];

/// A genome index: CpG site catalogue plus chromosome table.
///
/// Built once per reference genome and shared read-only by query
/// translation and methylome validation.
#[derive(Debug, Clone, Default)]
pub struct GenomeIndex {
    data: GenomeIndexData,
    meta: GenomeIndexMetadata,
}

impl GenomeIndex {
    pub fn meta(&self) -> &GenomeIndexMetadata {
        &self.meta
    }

    pub fn data(&self) -> &GenomeIndexData {
        &self.data
    }

    pub fn n_cpgs(&self) -> u32 {
        self.meta.n_cpgs
    }

    /// Builds an index from `(chromosome name, sequence)` records.
    ///
    /// Chromosome ids follow the order of appearance. Each sequence is
    /// scanned once, left to right, for CpG dinucleotides; scans run in
    /// parallel across chromosomes.
    pub fn build<S>(
        genome_name: &str,
        records: &[(String, S)],
    ) -> Result<Self>
    where
        S: AsRef<[u8]> + Sync, {
        if !is_valid_name(genome_name) {
            return Err(MethdexError::InvalidName(genome_name.to_string()));
        }
        let n_unique = records.iter().map(|(name, _)| name).unique().count();
        if n_unique != records.len() {
            return Err(MethdexError::MalformedReference(
                "duplicate chromosome names".to_string(),
            ));
        }
        if let Some((name, _)) = records
            .iter()
            .find(|(_, seq)| seq.as_ref().is_empty())
        {
            return Err(MethdexError::MalformedReference(format!(
                "chromosome {} has zero length",
                name
            )));
        }

        let positions: Vec<Vec<PosType>> = THREAD_POOL.install(|| {
            records
                .par_iter()
                .map(|(_, seq)| data::scan_cpgs(seq.as_ref()))
                .collect()
        });

        let chrom_names = records
            .iter()
            .map(|(name, _)| name.clone())
            .collect_vec();
        let chrom_sizes = records
            .iter()
            .map(|(_, seq)| seq.as_ref().len() as PosType)
            .collect_vec();
        let chrom_offsets = positions
            .iter()
            .scan(0u32, |acc, p| {
                let offset = *acc;
                *acc += p.len() as u32;
                Some(offset)
            })
            .collect_vec();
        let n_cpgs = positions.iter().map(|p| p.len() as u32).sum();

        let data = GenomeIndexData::new(positions);
        let meta = GenomeIndexMetadata::new(
            env!("CARGO_PKG_VERSION").to_string(),
            genome_name.to_string(),
            data.hash()?,
            n_cpgs,
            chrom_names,
            chrom_sizes,
            chrom_offsets,
        );
        info!(
            "built genome index {}: {} chroms, {} CpG sites",
            genome_name,
            meta.n_chroms(),
            n_cpgs
        );
        Ok(Self { data, meta })
    }

    /// Builds an index from a reference FASTA file; the genome name is
    /// parsed from the file name.
    pub fn from_fasta(path: &Path) -> Result<Self> {
        let genome_name = Self::parse_genome_name(path)?;
        if !path.exists() {
            return Err(MethdexError::NotFound(path.to_path_buf()));
        }
        let reader =
            bio::io::fasta::Reader::new(std::io::BufReader::new(
                std::fs::File::open(path)?,
            ));
        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            records.push((record.id().to_string(), record.seq().to_owned()));
        }
        Self::build(&genome_name, &records)
    }

    /// Loads a persisted index, checking structural invariants and the
    /// content hash eagerly.
    pub fn read(
        directory: impl AsRef<Path>,
        genome_name: &str,
    ) -> Result<Self> {
        let directory = directory.as_ref();
        let meta = GenomeIndexMetadata::read(
            &GenomeIndexMetadata::compose_filename(directory, genome_name),
        )?;
        let data = GenomeIndexData::read(
            &GenomeIndexData::compose_filename(directory, genome_name),
            &meta,
        )?;
        if data.hash()? != meta.index_hash {
            return Err(MethdexError::CorruptIndex(
                "index hash does not match metadata".to_string(),
            ));
        }
        debug!(
            "read genome index {} from {}",
            genome_name,
            directory.display()
        );
        Ok(Self { data, meta })
    }

    /// Persists the index as a metadata and a data file.
    ///
    /// Both files are written via atomic rename; if the second write fails
    /// the first file is removed so no half-written pair remains.
    pub fn write(
        &self,
        directory: impl AsRef<Path>,
        name: &str,
    ) -> Result<()> {
        let directory = directory.as_ref();
        let data_path = GenomeIndexData::compose_filename(directory, name);
        let meta_path = GenomeIndexMetadata::compose_filename(directory, name);
        self.data.write(&data_path)?;
        if let Err(e) = self.meta.write(&meta_path) {
            let _ = std::fs::remove_file(&data_path);
            return Err(e);
        }
        Ok(())
    }

    /// Structural self-check: metadata invariants, data invariants and the
    /// content hash all agree.
    pub fn is_consistent(&self) -> bool {
        self.meta.validate().is_ok()
            && self.data.validate(&self.meta).is_ok()
            && self
                .data
                .hash()
                .is_ok_and(|h| h == self.meta.index_hash)
    }

    /// Whether another index describes the same reference.
    pub fn is_consistent_with(
        &self,
        other: &GenomeIndex,
    ) -> bool {
        self.meta.index_hash == other.meta.index_hash
    }

    /// Translates intervals into global CpG index ranges, in input order.
    pub fn make_query(
        &self,
        intervals: &[GenomicInterval],
    ) -> Result<Query> {
        self.data.make_query(&self.meta, intervals)
    }

    /// Query over the fixed-size bin grid covering the whole genome.
    pub fn make_bins_query(
        &self,
        bin_size: PosType,
    ) -> Result<Query> {
        self.make_query(&bin_intervals(&self.meta.chrom_sizes, bin_size))
    }

    /// Query over sliding windows covering the whole genome.
    pub fn make_windows_query(
        &self,
        window_size: PosType,
        window_step: PosType,
    ) -> Result<Query> {
        self.make_query(&window_intervals(
            &self.meta.chrom_sizes,
            window_size,
            window_step,
        ))
    }

    /// Per-interval CpG site counts, computed from the same binary search
    /// ranges as [`make_query`](Self::make_query).
    pub fn get_n_cpgs(
        &self,
        intervals: &[GenomicInterval],
    ) -> Result<Vec<u32>> {
        Ok(self.make_query(intervals)?.n_cpgs())
    }

    /// Per-bin CpG site counts over the genome-wide bin grid.
    pub fn get_n_cpgs_bins(
        &self,
        bin_size: PosType,
    ) -> Result<Vec<u32>> {
        Ok(self.make_bins_query(bin_size)?.n_cpgs())
    }

    /// Per-window CpG site counts over genome-wide sliding windows.
    pub fn get_n_cpgs_windows(
        &self,
        window_size: PosType,
        window_step: PosType,
    ) -> Result<Vec<u32>> {
        Ok(self
            .make_windows_query(window_size, window_step)?
            .n_cpgs())
    }

    /// Whether both persisted files of a named index exist.
    pub fn files_exist(
        directory: impl AsRef<Path>,
        genome_name: &str,
    ) -> bool {
        let directory = directory.as_ref();
        GenomeIndexMetadata::compose_filename(directory, genome_name).exists()
            && GenomeIndexData::compose_filename(directory, genome_name)
                .exists()
    }

    /// Names of all complete index file pairs in a directory, in stable
    /// sorted order.
    pub fn list_genome_indexes(
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
            if GenomeIndexData::compose_filename(directory, name).exists() {
                names.push(name.to_string());
            }
        }
        names.sort_unstable();
        Ok(names)
    }

    /// Derives the genome name from a reference file name by stripping a
    /// recognized FASTA suffix.
    pub fn parse_genome_name(filename: &Path) -> Result<String> {
        let name = filename
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| {
                MethdexError::InvalidName(filename.display().to_string())
            })?;
        FASTA_SUFFIXES
            .iter()
            .find_map(|suffix| name.strip_suffix(suffix))
            .map(String::from)
            .ok_or_else(|| MethdexError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn fixture_chr1() -> (String, Vec<u8>) {
        // length 300 with CpGs at exactly {10, 50, 120, 250}
        let mut seq = vec![b'A'; 300];
        for &pos in &[10usize, 50, 120, 250] {
            seq[pos] = b'C';
            seq[pos + 1] = b'G';
        }
        ("chr1".to_string(), seq)
    }

    #[test]
    fn test_build_fixture_scenario() {
        let index = GenomeIndex::build("demo", &[fixture_chr1()]).unwrap();
        assert_eq!(index.n_cpgs(), 4);
        assert!(index.is_consistent());

        let interval = index.meta().interval("chr1", 100, 200).unwrap();
        let query = index.make_query(&[interval]).unwrap();
        assert_eq!(query.n_cpgs(), vec![1]);
        assert_eq!(index.get_n_cpgs(&[interval]).unwrap(), vec![1]);
    }

    #[test]
    fn test_build_positions_strictly_increasing() {
        let records = vec![
            ("chr1".to_string(), b"CGCGTTACGGCGATCG".to_vec()),
            ("chr2".to_string(), b"TTCGACGTCG".to_vec()),
        ];
        let index = GenomeIndex::build("demo", &records).unwrap();
        for chrom_id in 0..index.meta().n_chroms() as u32 {
            let positions = index.data().positions(chrom_id).unwrap();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_build_rejects_duplicates_and_empty() {
        let dup = vec![
            ("chr1".to_string(), b"ACGT".to_vec()),
            ("chr1".to_string(), b"ACGT".to_vec()),
        ];
        assert!(matches!(
            GenomeIndex::build("demo", &dup),
            Err(MethdexError::MalformedReference(_))
        ));

        let empty = vec![("chr1".to_string(), Vec::<u8>::new())];
        assert!(matches!(
            GenomeIndex::build("demo", &empty),
            Err(MethdexError::MalformedReference(_))
        ));
    }

    #[test]
    fn test_build_rejects_invalid_genome_name() {
        let records = vec![("chr1".to_string(), b"ACGT".to_vec())];
        assert!(matches!(
            GenomeIndex::build("bad name", &records),
            Err(MethdexError::InvalidName(_))
        ));
    }

    #[test]
    fn test_query_sum_equals_n_cpgs() {
        let records = vec![
            ("chr1".to_string(), b"CGCGTTACGGCGATCG".to_vec()),
            ("chr2".to_string(), b"TTCGACGTCG".to_vec()),
        ];
        let index = GenomeIndex::build("demo", &records).unwrap();
        let intervals = vec![
            index.meta().interval("chr1", 0, 16).unwrap(),
            index.meta().interval("chr2", 2, 8).unwrap(),
        ];
        let query = index.make_query(&intervals).unwrap();
        let total: u64 = query.n_cpgs_total();
        let n_cpgs: u32 = index
            .get_n_cpgs(&intervals)
            .unwrap()
            .iter()
            .sum();
        assert_eq!(total, n_cpgs as u64);
    }

    #[test]
    fn test_bins_query_counts_whole_genome() {
        let records = vec![fixture_chr1()];
        let index = GenomeIndex::build("demo", &records).unwrap();
        let counts = index.get_n_cpgs_bins(100).unwrap();
        assert_eq!(counts, vec![2, 1, 1]);
        let total: u32 = counts.iter().sum();
        assert_eq!(total, index.n_cpgs());
    }

    #[test]
    fn test_windows_query_order_and_clipping() {
        let records = vec![fixture_chr1()];
        let index = GenomeIndex::build("demo", &records).unwrap();
        let query = index.make_windows_query(100, 50).unwrap();
        assert_eq!(
            query.len() as u64,
            index.meta().n_windows(50)
        );
        // windows starting at 0, 50, 100, 150, 200, 250
        assert_eq!(query.n_cpgs(), vec![2, 2, 1, 0, 1, 1]);
    }

    #[test]
    fn test_unknown_chrom_name() {
        let index = GenomeIndex::build("demo", &[fixture_chr1()]).unwrap();
        assert!(matches!(
            index.meta().interval("chrX", 0, 10),
            Err(MethdexError::ChromosomeNotFound(_))
        ));
    }

    #[test]
    fn test_parse_genome_name() {
        for filename in [
            "hg38.fa",
            "hg38.fa.gz",
            "hg38.faa",
            "hg38.fasta",
            "hg38.fasta.gz",
            "some/dir/hg38.fa",
        ] {
            assert_eq!(
                GenomeIndex::parse_genome_name(Path::new(filename)).unwrap(),
                "hg38"
            );
        }
        assert!(GenomeIndex::parse_genome_name(Path::new("hg38.txt")).is_err());
    }
}
