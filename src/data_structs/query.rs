use serde::{
    Deserialize,
    Serialize,
};

/// A half-open range `[start, end)` of global CpG site indices.
///
/// `start == end` is a valid range denoting zero overlapping sites.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct QueryRange {
    pub start: u32,
    pub end:   u32,
}

impl QueryRange {
    pub fn new(
        start: u32,
        end: u32,
    ) -> Self {
        assert!(start <= end, "Query range start must not exceed end");
        Self { start, end }
    }

    /// Number of CpG sites covered by the range.
    pub fn n_cpgs(&self) -> u32 {
        self.end - self.start
    }
}

/// An ordered sequence of CpG index ranges, one per queried interval, bin or
/// window, in exactly the input order.
///
/// Produced by the genome index and consumed by the levels aggregation;
/// the positional correspondence between ranges and inputs carries over to
/// the rows of the resulting levels matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    ranges: Vec<QueryRange>,
}

impl Query {
    pub fn new(ranges: Vec<QueryRange>) -> Self {
        Self { ranges }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryRange> {
        self.ranges.iter()
    }

    /// Per-range CpG site counts, in query order.
    pub fn n_cpgs(&self) -> Vec<u32> {
        self.ranges.iter().map(QueryRange::n_cpgs).collect()
    }

    /// Total number of CpG sites covered across all ranges.
    pub fn n_cpgs_total(&self) -> u64 {
        self.ranges
            .iter()
            .map(|r| r.n_cpgs() as u64)
            .sum()
    }
}

impl FromIterator<QueryRange> for Query {
    fn from_iter<I: IntoIterator<Item = QueryRange>>(iter: I) -> Self {
        Self {
            ranges: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Query {
    type IntoIter = std::slice::Iter<'a, QueryRange>;
    type Item = &'a QueryRange;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}
