use sha2::{Digest, Sha256};
use std::{fs, path::Path};

use crate::error::{CoreError, Result};
use crate::report::model::{ArtifactHash, ArtifactInfo};

/// Raw artifact context used during analysis.
///
/// Holds the bytes used for content sniffing and a fingerprint that
/// identifies the analysed file in the report.
#[derive(Debug, Clone)]
pub struct ArtifactContext {
    /// Exact bytes read from disk.
    pub bytes: Vec<u8>,

    /// Size of the artifact in bytes.
    pub size_bytes: u64,

    /// Hash algorithm used for fingerprinting.
    pub hash_alg: String,

    /// Hex-encoded hash of the artifact bytes.
    pub hash_hex: String,
}

impl ArtifactContext {
    /// Convert into the report-facing artifact metadata, dropping the bytes.
    pub fn into_artifact(self) -> ArtifactInfo {
        ArtifactInfo {
            size_bytes: self.size_bytes,
            hash: ArtifactHash {
                algorithm: self.hash_alg,
                value: self.hash_hex,
            },
        }
    }
}

/// Read an artifact and compute a stable identity from its bytes only.
pub fn read_artifact(path: &Path) -> Result<ArtifactContext> {
    let bytes = fs::read(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let digest = Sha256::digest(&bytes);

    Ok(ArtifactContext {
        size_bytes: bytes.len() as u64,
        bytes,
        hash_alg: "sha256".to_string(),
        hash_hex: hex::encode(digest),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_artifact(data: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_bytes_and_computes_stable_hash() {
        let file = temp_artifact(b"elflint-test");

        let ctx = read_artifact(file.path()).expect("artifact read succeeds");

        assert_eq!(ctx.bytes, b"elflint-test");
        assert_eq!(ctx.size_bytes, 12);
        assert_eq!(ctx.hash_alg, "sha256");

        // echo -n "elflint-test" | sha256sum
        assert_eq!(
            ctx.hash_hex,
            "89312752507b5535c2ea7283f61276cecc154bf4e7580a9478a314998980e8fb"
        );
    }

    #[test]
    fn different_inputs_produce_different_hashes() {
        let a = read_artifact(temp_artifact(b"data-a").path()).unwrap();
        let b = read_artifact(temp_artifact(b"data-b").path()).unwrap();

        assert_ne!(a.hash_hex, b.hash_hex);
    }

    #[test]
    fn missing_file_returns_error() {
        let result = read_artifact(Path::new("non_existent.so"));
        assert!(matches!(result, Err(CoreError::Io { .. })));
    }
}
