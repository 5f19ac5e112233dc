//! Content-derived identifiers

use sha2::{Digest, Sha256};

/// First 8 hex characters of the SHA-256 of `input`.
pub fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Full hex SHA-256 of raw bytes.
pub fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// `method_<hash8(file|class|name|start|end)>`
pub fn method_id(file: &str, class: Option<&str>, name: &str, start: usize, end: usize) -> String {
    format!(
        "method_{}",
        short_hash(&format!("{}|{}|{}|{}|{}", file, class.unwrap_or(""), name, start, end))
    )
}

/// `class_<hash8(file|namespace|name|start|end)>`
pub fn class_id(
    file: &str,
    namespace: Option<&str>,
    name: &str,
    start: usize,
    end: usize,
) -> String {
    format!(
        "class_{}",
        short_hash(&format!("{}|{}|{}|{}|{}", file, namespace.unwrap_or(""), name, start, end))
    )
}
