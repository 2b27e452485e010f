//! Sort signature checksums
//!
//! A saved reader position is only meaningful under the sort it was produced
//! with. The signature travels with the saved state and is compared on restore.

use super::types::SortSpecification;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of digest bytes kept in a signature
const SIGNATURE_BYTES: usize = 8;

/// Hex checksum of a sort specification's canonical rendering
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSignature(String);

impl SortSignature {
    /// Compute the signature of a sort specification
    pub fn of(sort: &SortSpecification) -> Self {
        let digest = Sha256::digest(sort.canonical().as_bytes());
        Self(hex::encode(&digest[..SIGNATURE_BYTES]))
    }

    /// Wrap a previously persisted signature
    pub fn from_persisted(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Hex string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SortSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
