use sha3::{Digest, Keccak256};
use std::path::Path;

/// Single Keccak256 fingerprint over every artifact file, in the order given.
/// Each file is length-prefixed so moving bytes between files changes the hash.
pub fn compute_model_commitment(paths: &[&Path]) -> std::io::Result<String> {
    let mut hasher = Keccak256::new();
    for path in paths {
        let bytes = std::fs::read(path)?;
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(format!("0x{}", hex::encode(hasher.finalize())))
}
