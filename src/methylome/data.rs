use std::path::{
    Path,
    PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::data_structs::{
    Level,
    LevelElement,
    LevelElementCovered,
    Query,
    SiteCounts,
};
use crate::error::{
    MethdexError,
    Result,
};
use crate::utils::{
    atomic_write,
    content_hash,
};

/// Extension of the binary data file of a persisted methylome.
pub const FILENAME_EXTENSION: &str = ".cpg_meth";

/// Per-site methylated/total read counts over the flat CpG index space of a
/// genome index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethylomeData {
    sites: Vec<SiteCounts>,
}

impl MethylomeData {
    /// Wraps raw per-site counts, checking `n_meth <= n_total` for every
    /// site.
    pub fn from_counts(sites: Vec<SiteCounts>) -> Result<Self> {
        if sites.iter().any(|s| s.n_meth > s.n_total) {
            return Err(MethdexError::InvalidMethylomeData);
        }
        Ok(Self { sites })
    }

    pub fn n_cpgs(&self) -> u32 {
        self.sites.len() as u32
    }

    pub fn sites(&self) -> &[SiteCounts] {
        &self.sites
    }

    pub fn hash(&self) -> Result<u64> {
        content_hash(&self.sites)
    }

    /// Element-wise accumulation of another methylome's counts, used to
    /// merge replicates. Counts saturate at the storage type's maximum.
    pub fn add(
        &mut self,
        other: &MethylomeData,
    ) -> Result<()> {
        if self.sites.len() != other.sites.len() {
            return Err(MethdexError::SizeMismatch(
                self.sites.len(),
                other.sites.len(),
            ));
        }
        for (lhs, rhs) in self.sites.iter_mut().zip(other.sites.iter()) {
            lhs.n_meth = lhs.n_meth.saturating_add(rhs.n_meth);
            lhs.n_total = lhs.n_total.saturating_add(rhs.n_total);
        }
        Ok(())
    }

    /// Aggregates counts over each query range, one output element per
    /// range, in query order. Sites with zero coverage contribute zeros.
    ///
    /// Fails with [`MethdexError::SizeMismatch`] when a range reaches past
    /// the end of the site array, i.e. the query was built against a
    /// different genome index.
    pub fn get_levels<E: Level>(
        &self,
        query: &Query,
    ) -> Result<Vec<E>> {
        if let Some(range) = query
            .iter()
            .find(|r| r.end as usize > self.sites.len())
        {
            return Err(MethdexError::SizeMismatch(
                range.end as usize,
                self.sites.len(),
            ));
        }
        let mut levels = vec![E::default(); query.len()];
        self.get_levels_into(query, &mut levels);
        Ok(levels)
    }

    /// As [`get_levels`](Self::get_levels), writing into a caller-provided
    /// slice (one column of a levels matrix). Every range must lie within
    /// the site array; callers check index consistency first.
    pub(crate) fn get_levels_into<E: Level>(
        &self,
        query: &Query,
        out: &mut [E],
    ) {
        debug_assert_eq!(query.len(), out.len());
        for (range, cell) in query.iter().zip(out.iter_mut()) {
            let mut level = E::default();
            for site in &self.sites[range.start as usize..range.end as usize] {
                level.accumulate(*site);
            }
            *cell = level;
        }
    }

    /// Genome-wide methylated/total counts.
    pub fn global_levels(&self) -> LevelElement {
        let mut level = LevelElement::default();
        for site in &self.sites {
            level.accumulate(*site);
        }
        level
    }

    /// Genome-wide counts plus the number of covered sites.
    pub fn global_levels_covered(&self) -> LevelElementCovered {
        let mut level = LevelElementCovered::default();
        for site in &self.sites {
            level.accumulate(*site);
        }
        level
    }

    pub fn compose_filename(
        directory: &Path,
        name: &str,
    ) -> PathBuf {
        directory.join(format!("{}{}", name, FILENAME_EXTENSION))
    }

    pub fn read(
        path: &Path,
        expected_n_cpgs: u32,
    ) -> Result<Self> {
        if !path.exists() {
            return Err(MethdexError::NotFound(path.to_path_buf()));
        }
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        let data: Self = bincode::deserialize_from(reader)?;
        if data.n_cpgs() != expected_n_cpgs {
            return Err(MethdexError::InvalidMethylomeData);
        }
        if data.sites.iter().any(|s| s.n_meth > s.n_total) {
            return Err(MethdexError::InvalidMethylomeData);
        }
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
    use crate::data_structs::QueryRange;

    fn demo_data() -> MethylomeData {
        MethylomeData::from_counts(vec![
            SiteCounts::new(1, 2),
            SiteCounts::new(0, 0),
            SiteCounts::new(3, 5),
            SiteCounts::new(2, 2),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_counts_rejects_invalid() {
        let sites = vec![SiteCounts {
            n_meth:  5,
            n_total: 2,
        }];
        assert!(matches!(
            MethylomeData::from_counts(sites),
            Err(MethdexError::InvalidMethylomeData)
        ));
    }

    #[test]
    fn test_get_levels_over_ranges() {
        let data = demo_data();
        let query = Query::new(vec![
            QueryRange::new(0, 2),
            QueryRange::new(2, 2),
            QueryRange::new(1, 4),
        ]);
        let levels: Vec<LevelElement> = data.get_levels(&query).unwrap();
        assert_eq!(levels, vec![
            LevelElement {
                n_meth:  1,
                n_total: 2,
            },
            LevelElement::default(),
            LevelElement {
                n_meth:  5,
                n_total: 7,
            },
        ]);

        let covered: Vec<LevelElementCovered> =
            data.get_levels(&query).unwrap();
        assert_eq!(covered[2].n_covered, 2);
        assert_eq!(covered[1].n_covered, 0);
    }

    #[test]
    fn test_get_levels_rejects_foreign_query() {
        let data = demo_data();
        // a range reaching past the 4-site store
        let query = Query::new(vec![QueryRange::new(2, 9)]);
        assert!(matches!(
            data.get_levels::<LevelElement>(&query),
            Err(MethdexError::SizeMismatch(9, 4))
        ));
    }

    #[test]
    fn test_global_levels() {
        let data = demo_data();
        assert_eq!(data.global_levels(), LevelElement {
            n_meth:  6,
            n_total: 9,
        });
        let covered = data.global_levels_covered();
        assert_eq!(covered.n_covered, 3);
    }

    #[test]
    fn test_global_levels_empty_store() {
        let data = MethylomeData::default();
        assert_eq!(data.global_levels(), LevelElement::default());
        assert_eq!(data.global_levels_covered().n_covered, 0);
    }

    #[test]
    fn test_add_merges_counts() {
        let mut a = demo_data();
        let b = demo_data();
        let global_a = a.global_levels();
        a.add(&b).unwrap();
        let merged = a.global_levels();
        assert_eq!(merged.n_meth, 2 * global_a.n_meth);
        assert_eq!(merged.n_total, 2 * global_a.n_total);
    }

    #[test]
    fn test_add_size_mismatch() {
        let mut a = demo_data();
        let b = MethylomeData::from_counts(vec![SiteCounts::new(1, 1)])
            .unwrap();
        assert!(matches!(
            a.add(&b),
            Err(MethdexError::SizeMismatch(4, 1))
        ));
    }

    #[test]
    fn test_read_rejects_invariant_violation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.cpg_meth");

        // bypass from_counts to persist a site with n_meth > n_total
        let bad = MethylomeData {
            sites: vec![SiteCounts {
                n_meth:  5,
                n_total: 2,
            }],
        };
        bad.write(&path).unwrap();

        assert!(matches!(
            MethylomeData::read(&path, 1),
            Err(MethdexError::InvalidMethylomeData)
        ));
    }

    #[test]
    fn test_add_saturates() {
        let mut a = MethylomeData::from_counts(vec![SiteCounts::new(
            u16::MAX,
            u16::MAX,
        )])
        .unwrap();
        let b = a.clone();
        a.add(&b).unwrap();
        assert_eq!(a.sites()[0].n_total, u16::MAX);
    }
}
