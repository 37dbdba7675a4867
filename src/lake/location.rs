use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of an object in the bronze lake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocation {
    pub bucket: String,
    pub path: String,
}

impl StorageLocation {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_bucket_and_path() {
        let location = StorageLocation::new(
            "datalake-dev-bronze",
            "eodhd/exchanges-list/2026/08/25.json.gz",
        );
        assert_eq!(
            location.to_string(),
            "datalake-dev-bronze/eodhd/exchanges-list/2026/08/25.json.gz"
        );
    }
}
