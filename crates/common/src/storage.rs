//! Object storage URLs for uploaded payment proofs
//!
//! Screenshots are uploaded straight to the bucket by the client; the service only
//! stores the object key and hands back a plain (unsigned) URL.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
}

impl StorageConfig {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    /// Public URL for a stored key
    pub fn object_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket,
            self.region,
            key.trim_start_matches('/')
        )
    }

    /// Check a client-supplied object key.
    ///
    /// Keys are relative paths of `[A-Za-z0-9._/-]`, at most 512 bytes, with no
    /// `..` segments.
    pub fn is_valid_key(key: &str) -> bool {
        !key.is_empty()
            && key.len() <= 512
            && !key.starts_with('/')
            && !key.split('/').any(|segment| segment.is_empty() || segment == "..")
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
    }
}
