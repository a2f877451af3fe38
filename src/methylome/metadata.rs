use std::path::{
    Path,
    PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::error::{
    MethdexError,
    Result,
};
use crate::utils::atomic_write;

/// Extension of the metadata sidecar file of a persisted methylome.
pub const FILENAME_EXTENSION: &str = ".cpg_meth.json";

/// Identity and summary of a methylome, tying it to the genome index it was
/// built against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethylomeMetadata {
    pub version:        String,
    pub methylome_hash: u64,
    pub index_hash:     u64,
    pub genome_name:    String,
    pub n_cpgs:         u32,
}

impl MethylomeMetadata {
    /// Whether two methylomes describe the same reference and site space.
    pub fn is_consistent_with(
        &self,
        other: &MethylomeMetadata,
    ) -> bool {
        self.index_hash == other.index_hash
            && self.n_cpgs == other.n_cpgs
            && self.genome_name == other.genome_name
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
        Ok(serde_json::from_reader(reader)?)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_consistent_with() {
        let a = MethylomeMetadata {
            version: "0.1.0".to_string(),
            methylome_hash: 1,
            index_hash: 42,
            genome_name: "hg38".to_string(),
            n_cpgs: 100,
        };
        let mut b = a.clone();
        b.methylome_hash = 2;
        assert!(a.is_consistent_with(&b));

        b.index_hash = 43;
        assert!(!a.is_consistent_with(&b));
    }
}
