use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};

use crate::data_structs::typedef::{
    AggCountType,
    CountType,
    DensityType,
};

/// Methylated and total read counts at a single CpG site.
///
/// Invariant: `n_meth <= n_total`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct SiteCounts {
    pub n_meth:  CountType,
    pub n_total: CountType,
}

impl SiteCounts {
    pub fn new(
        n_meth: CountType,
        n_total: CountType,
    ) -> Self {
        assert!(
            n_meth <= n_total,
            "Methylated count must not exceed total count"
        );
        Self { n_meth, n_total }
    }

    /// Whether at least one read covers the site.
    pub fn is_covered(&self) -> bool {
        self.n_total > 0
    }
}

/// A cell of a levels matrix: counts aggregated over one query range for one
/// methylome.
pub trait Level: Copy + Default + Send + Sync {
    /// Folds one site's counts into the aggregate.
    fn accumulate(
        &mut self,
        site: SiteCounts,
    );

    fn n_meth(&self) -> AggCountType;

    fn n_total(&self) -> AggCountType;

    /// Weighted mean methylation: `n_meth / n_total` when at least
    /// `min_reads` observations back the estimate, NaN otherwise.
    fn wmean(
        &self,
        min_reads: AggCountType,
    ) -> DensityType {
        if self.n_total() >= min_reads.max(1) {
            self.n_meth() as DensityType / self.n_total() as DensityType
        }
        else {
            DensityType::NAN
        }
    }
}

/// Aggregate methylated/total counts over a genomic region.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct LevelElement {
    pub n_meth:  AggCountType,
    pub n_total: AggCountType,
}

impl Level for LevelElement {
    fn accumulate(
        &mut self,
        site: SiteCounts,
    ) {
        self.n_meth += site.n_meth as AggCountType;
        self.n_total += site.n_total as AggCountType;
    }

    fn n_meth(&self) -> AggCountType {
        self.n_meth
    }

    fn n_total(&self) -> AggCountType {
        self.n_total
    }
}

/// Aggregate counts plus the number of sites carrying at least one read.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct LevelElementCovered {
    pub n_meth:    AggCountType,
    pub n_total:   AggCountType,
    pub n_covered: AggCountType,
}

impl Level for LevelElementCovered {
    fn accumulate(
        &mut self,
        site: SiteCounts,
    ) {
        self.n_meth += site.n_meth as AggCountType;
        self.n_total += site.n_total as AggCountType;
        self.n_covered += site.is_covered() as AggCountType;
    }

    fn n_meth(&self) -> AggCountType {
        self.n_meth
    }

    fn n_total(&self) -> AggCountType {
        self.n_total
    }
}

/// Column-major rows-by-columns matrix of aggregated levels.
///
/// Rows correspond to query ranges in query order, columns to methylomes in
/// request order. Constructed fresh per query and immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelsMatrix<E> {
    n_rows: usize,
    n_cols: usize,
    v:      Vec<E>,
}

impl<E: Level> LevelsMatrix<E> {
    pub fn new(
        n_rows: usize,
        n_cols: usize,
    ) -> Self {
        Self {
            n_rows,
            n_cols,
            v: vec![E::default(); n_rows * n_cols],
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn at(
        &self,
        row: usize,
        col: usize,
    ) -> &E {
        assert!(row < self.n_rows && col < self.n_cols);
        &self.v[col * self.n_rows + row]
    }

    /// One column as a slice, i.e. all rows for a single methylome.
    pub fn column(
        &self,
        col: usize,
    ) -> &[E] {
        &self.v[col * self.n_rows..(col + 1) * self.n_rows]
    }

    pub(crate) fn columns_mut(
        &mut self
    ) -> std::slice::ChunksMut<'_, E> {
        self.v.chunks_mut(self.n_rows.max(1))
    }

    pub(crate) fn par_columns_mut(
        &mut self
    ) -> rayon::slice::ChunksMut<'_, E> {
        self.v.par_chunks_mut(self.n_rows.max(1))
    }

    /// Weighted mean methylation per cell, one vector per column.
    ///
    /// Cells backed by fewer than `min_reads` observations report NaN; the
    /// computation never divides by zero.
    pub fn all_wmeans(
        &self,
        min_reads: AggCountType,
    ) -> Vec<Vec<DensityType>> {
        (0..self.n_cols)
            .map(|col| {
                self.column(col)
                    .iter()
                    .map(|e| e.wmean(min_reads))
                    .collect()
            })
            .collect()
    }
}
