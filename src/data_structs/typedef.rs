/// Genomic base offset within a chromosome.
pub type PosType = u32;
/// Per-site read count (methylated or total).
pub type CountType = u16;
/// Count aggregated over a genomic region.
pub type AggCountType = u32;
/// Methylation level fraction.
pub type DensityType = f32;
