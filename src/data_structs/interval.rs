use serde::{
    Deserialize,
    Serialize,
};

use crate::data_structs::typedef::PosType;

/// A half-open genomic interval `[start, stop)` on a chromosome identified
/// by its 0-based id in the genome index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GenomicInterval {
    pub chrom_id: u32,
    pub start:    PosType,
    pub stop:     PosType,
}

impl GenomicInterval {
    pub fn new(
        chrom_id: u32,
        start: PosType,
        stop: PosType,
    ) -> Self {
        assert!(
            start <= stop,
            "Interval start must be less than or equal to stop"
        );
        Self {
            chrom_id,
            start,
            stop,
        }
    }

    /// Length of the interval in bases.
    pub fn len(&self) -> PosType {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }
}

impl std::fmt::Display for GenomicInterval {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.chrom_id, self.start, self.stop)
    }
}

/// Generates fixed-size bin intervals covering every chromosome.
///
/// Chromosomes appear in id order; within a chromosome bins start at 0 and
/// advance by `bin_size`, the last bin clipped to the chromosome length.
pub fn bin_intervals(
    chrom_sizes: &[PosType],
    bin_size: PosType,
) -> Vec<GenomicInterval> {
    assert!(bin_size > 0, "Bin size must be positive");
    let mut intervals = Vec::new();
    for (chrom_id, &size) in chrom_sizes.iter().enumerate() {
        let mut start = 0;
        while start < size {
            let stop = size.min(start + bin_size);
            intervals.push(GenomicInterval::new(chrom_id as u32, start, stop));
            start += bin_size;
        }
    }
    intervals
}

/// Generates sliding window intervals covering every chromosome.
///
/// Windows start at `k * window_step` for `k = 0, 1, ...` while the start is
/// inside the chromosome, each clipped to the chromosome length.
pub fn window_intervals(
    chrom_sizes: &[PosType],
    window_size: PosType,
    window_step: PosType,
) -> Vec<GenomicInterval> {
    assert!(
        window_size > 0 && window_step > 0,
        "Window size and step must be positive"
    );
    let mut intervals = Vec::new();
    for (chrom_id, &size) in chrom_sizes.iter().enumerate() {
        let mut start = 0;
        while start < size {
            let stop = size.min(start + window_size);
            intervals.push(GenomicInterval::new(chrom_id as u32, start, stop));
            start += window_step;
        }
    }
    intervals
}
