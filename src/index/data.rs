use std::path::{
    Path,
    PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};

use super::metadata::GenomeIndexMetadata;
use crate::data_structs::typedef::PosType;
use crate::data_structs::{
    GenomicInterval,
    Query,
    QueryRange,
};
use crate::error::{
    MethdexError,
    Result,
};
use crate::utils::{
    atomic_write,
    content_hash,
};

/// Extension of the binary data file of a persisted genome index.
pub const FILENAME_EXTENSION: &str = ".cpg_idx";

/// Per-chromosome CpG site positions, strictly increasing within each
/// chromosome.
///
/// The concatenation of all chromosomes' positions, in chromosome id order,
/// defines the flat global CpG index space shared with methylomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeIndexData {
    pub(crate) positions: Vec<Vec<PosType>>,
}

/// Records the offset of every `C` of a CpG dinucleotide in one forward
/// scan. Case-insensitive; ambiguous bases never match.
pub(crate) fn scan_cpgs(seq: &[u8]) -> Vec<PosType> {
    // rough CpG density upper bound used to presize the output
    let mut cpgs = Vec::with_capacity(seq.len() / 16);
    for (pos, pair) in seq.windows(2).enumerate() {
        if pair[0].eq_ignore_ascii_case(&b'C') && pair[1].eq_ignore_ascii_case(&b'G')
        {
            cpgs.push(pos as PosType);
        }
    }
    cpgs
}

impl GenomeIndexData {
    pub(crate) fn new(positions: Vec<Vec<PosType>>) -> Self {
        Self { positions }
    }

    pub fn n_chroms(&self) -> usize {
        self.positions.len()
    }

    pub fn n_cpgs(&self) -> u32 {
        self.positions.iter().map(|p| p.len() as u32).sum()
    }

    pub fn positions(
        &self,
        chrom_id: u32,
    ) -> Option<&[PosType]> {
        self.positions
            .get(chrom_id as usize)
            .map(Vec::as_slice)
    }

    /// Content hash over all positions; stamped into the metadata.
    pub fn hash(&self) -> Result<u64> {
        content_hash(&self.positions)
    }

    /// Translates one interval into a local CpG index range on its
    /// chromosome via binary search, then offsets it into the global index
    /// space.
    pub(crate) fn translate(
        &self,
        meta: &GenomeIndexMetadata,
        interval: &GenomicInterval,
    ) -> Result<QueryRange> {
        let positions = self
            .positions(interval.chrom_id)
            .ok_or_else(|| {
                MethdexError::ChromosomeNotFound(interval.chrom_id.to_string())
            })?;
        let lo = positions.partition_point(|&p| p < interval.start);
        let hi = lo + positions[lo..].partition_point(|&p| p < interval.stop);
        let offset = meta.chrom_offsets[interval.chrom_id as usize];
        Ok(QueryRange::new(offset + lo as u32, offset + hi as u32))
    }

    /// Translates intervals into a [`Query`], preserving input order.
    ///
    /// Fails on the first interval referencing an unknown chromosome id;
    /// no partial query is returned.
    pub fn make_query(
        &self,
        meta: &GenomeIndexMetadata,
        intervals: &[GenomicInterval],
    ) -> Result<Query> {
        intervals
            .iter()
            .map(|gi| self.translate(meta, gi))
            .collect::<Result<Query>>()
    }

    /// Checks structural invariants against the metadata chromosome table.
    pub fn validate(
        &self,
        meta: &GenomeIndexMetadata,
    ) -> Result<()> {
        if self.positions.len() != meta.n_chroms() {
            return Err(MethdexError::CorruptIndex(format!(
                "chrom count mismatch: {} != {}",
                self.positions.len(),
                meta.n_chroms()
            )));
        }
        let expected = meta.n_cpgs_per_chrom();
        for (chrom_id, (positions, &n_expected)) in
            self.positions.iter().zip(expected.iter()).enumerate()
        {
            if positions.len() as u32 != n_expected {
                return Err(MethdexError::CorruptIndex(format!(
                    "CpG count mismatch on chrom {}: {} != {}",
                    chrom_id,
                    positions.len(),
                    n_expected
                )));
            }
            let increasing = positions.windows(2).all(|w| w[0] < w[1]);
            if !increasing {
                return Err(MethdexError::CorruptIndex(format!(
                    "positions not strictly increasing on chrom {}",
                    chrom_id
                )));
            }
            if positions
                .last()
                .is_some_and(|&p| p >= meta.chrom_sizes[chrom_id])
            {
                return Err(MethdexError::CorruptIndex(format!(
                    "position past chrom end on chrom {}",
                    chrom_id
                )));
            }
        }
        Ok(())
    }

    pub fn compose_filename(
        directory: &Path,
        name: &str,
    ) -> PathBuf {
        directory.join(format!("{}{}", name, FILENAME_EXTENSION))
    }

    pub fn read(
        path: &Path,
        meta: &GenomeIndexMetadata,
    ) -> Result<Self> {
        if !path.exists() {
            return Err(MethdexError::NotFound(path.to_path_buf()));
        }
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        let data: Self = bincode::deserialize_from(reader)?;
        data.validate(meta)?;
        Ok(data)
    }

    pub fn write(
        &self,
        path: &Path,
    ) -> Result<()> {
        atomic_write(path, |writer| {
            bincode::serialize_into(writer, self)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_meta(
        sizes: Vec<PosType>,
        offsets: Vec<u32>,
        n_cpgs: u32,
    ) -> GenomeIndexMetadata {
        let names = (0..sizes.len())
            .map(|i| format!("chr{}", i + 1))
            .collect();
        GenomeIndexMetadata::new(
            "0.1.0".to_string(),
            "demo".to_string(),
            0,
            n_cpgs,
            names,
            sizes,
            offsets,
        )
    }

    #[test]
    fn test_scan_cpgs_basic() {
        assert_eq!(scan_cpgs(b"ACGTCG"), vec![1, 4]);
        assert_eq!(scan_cpgs(b"cgCgcG"), vec![0, 2, 4]);
        assert_eq!(scan_cpgs(b"AAAA"), Vec::<PosType>::new());
        assert_eq!(scan_cpgs(b""), Vec::<PosType>::new());
        // ambiguous bases do not form CpGs
        assert_eq!(scan_cpgs(b"ANGCNG"), Vec::<PosType>::new());
    }

    #[test]
    fn test_scan_cpgs_strictly_increasing() {
        let positions = scan_cpgs(b"CGCGCGTTACGGCG");
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_translate_fixture() {
        // chr1 of length 300 with CpGs at {10, 50, 120, 250}
        let data = GenomeIndexData::new(vec![vec![10, 50, 120, 250]]);
        let meta = demo_meta(vec![300], vec![0], 4);

        let range = data
            .translate(&meta, &GenomicInterval::new(0, 100, 200))
            .unwrap();
        assert_eq!(range, QueryRange::new(2, 3));

        let query = data
            .make_query(&meta, &[GenomicInterval::new(0, 100, 200)])
            .unwrap();
        assert_eq!(query.n_cpgs(), vec![1]);
    }

    #[test]
    fn test_translate_boundaries() {
        let data = GenomeIndexData::new(vec![vec![10, 50, 120, 250]]);
        let meta = demo_meta(vec![300], vec![0], 4);

        // start exactly on a site includes it; stop exactly on a site
        // excludes it
        let on_site = data
            .translate(&meta, &GenomicInterval::new(0, 50, 120))
            .unwrap();
        assert_eq!(on_site, QueryRange::new(1, 2));

        let whole = data
            .translate(&meta, &GenomicInterval::new(0, 0, 300))
            .unwrap();
        assert_eq!(whole, QueryRange::new(0, 4));

        let empty = data
            .translate(&meta, &GenomicInterval::new(0, 150, 150))
            .unwrap();
        assert_eq!(empty.n_cpgs(), 0);

        let past_sites = data
            .translate(&meta, &GenomicInterval::new(0, 260, 300))
            .unwrap();
        assert_eq!(past_sites, QueryRange::new(4, 4));
    }

    #[test]
    fn test_translate_global_offset() {
        let data =
            GenomeIndexData::new(vec![vec![10, 50], vec![5, 20, 40]]);
        let meta = demo_meta(vec![100, 50], vec![0, 2], 5);

        let range = data
            .translate(&meta, &GenomicInterval::new(1, 0, 50))
            .unwrap();
        assert_eq!(range, QueryRange::new(2, 5));
    }

    #[test]
    fn test_unknown_chrom_fails() {
        let data = GenomeIndexData::new(vec![vec![10]]);
        let meta = demo_meta(vec![100], vec![0], 1);
        let err = data
            .make_query(&meta, &[GenomicInterval::new(7, 0, 10)])
            .unwrap_err();
        assert!(matches!(err, MethdexError::ChromosomeNotFound(_)));
    }

    #[test]
    fn test_validate_rejects_nonincreasing() {
        let data = GenomeIndexData::new(vec![vec![10, 10]]);
        let meta = demo_meta(vec![100], vec![0], 2);
        assert!(matches!(
            data.validate(&meta),
            Err(MethdexError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_validate_rejects_count_mismatch() {
        let data = GenomeIndexData::new(vec![vec![10, 20, 30]]);
        let meta = demo_meta(vec![100], vec![0], 2);
        assert!(data.validate(&meta).is_err());
    }
}
