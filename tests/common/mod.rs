#![allow(dead_code)]

use methdex::prelude::*;
use rand::{
    Rng,
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;

pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

pub fn generate_sequence<R: Rng>(
    rng: &mut R,
    length: usize,
) -> Vec<u8> {
    let chars = [b'A', b'C', b'G', b'T'];
    (0..length)
        .map(|_| chars[rng.gen_range(0..4)])
        .collect()
}

pub fn generate_genome(
    seed: u64,
    n_chroms: usize,
    chrom_length: usize,
) -> Vec<(String, Vec<u8>)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n_chroms)
        .map(|i| {
            (
                format!("chr{}", i + 1),
                generate_sequence(&mut rng, chrom_length),
            )
        })
        .collect()
}

pub fn generate_index(
    genome_name: &str,
    seed: u64,
    n_chroms: usize,
    chrom_length: usize,
) -> GenomeIndex {
    let records = generate_genome(seed, n_chroms, chrom_length);
    GenomeIndex::build(genome_name, &records).unwrap()
}

/// A methylome over the index's CpG sites with pseudo-random coverage;
/// roughly one site in five is left uncovered.
pub fn generate_methylome(
    index: &GenomeIndex,
    seed: u64,
) -> Methylome {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let sites = (0..index.n_cpgs())
        .map(|_| {
            let n_total: u16 = if rng.gen_range(0..5) == 0 {
                0
            }
            else {
                rng.gen_range(1..30)
            };
            let n_meth = rng.gen_range(0..=n_total);
            SiteCounts::new(n_meth, n_total)
        })
        .collect();
    Methylome::new(MethylomeData::from_counts(sites).unwrap(), index)
        .unwrap()
}
