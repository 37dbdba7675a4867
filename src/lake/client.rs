use crate::config::settings::LakeSettings;
use crate::lake::location::StorageLocation;
use crate::utils::error::{QuanterraError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use object_store::{path::Path as ObjectPath, Attribute, Attributes, ObjectStore, PutOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Gzip member header magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Client for the bronze data lake bucket.
///
/// The backend is any `object_store` URL. Production uses `gs://` buckets with
/// credentials picked up from the environment; tests use the in-memory store.
#[derive(Debug, Clone)]
pub struct LakeClient {
    bucket: String,
    prefix: ObjectPath,
    store: Arc<dyn ObjectStore>,
}

impl LakeClient {
    pub fn connect(settings: &LakeSettings) -> Result<Self> {
        let raw_url = settings
            .url
            .clone()
            .unwrap_or_else(|| format!("gs://{}", settings.bucket));

        let url = Url::parse(&raw_url).map_err(|e| QuanterraError::InvalidConfigValueError {
            field: "lake.url".to_string(),
            value: raw_url.clone(),
            reason: format!("Invalid object store URL: {}", e),
        })?;

        let (store, prefix) = object_store::parse_url(&url)?;
        Ok(Self {
            bucket: settings.bucket.clone(),
            prefix,
            store: Arc::from(store),
        })
    }

    pub fn with_store(bucket: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: ObjectPath::default(),
            store,
        }
    }

    pub fn in_memory(bucket: impl Into<String>) -> Self {
        Self::with_store(bucket, Arc::new(object_store::memory::InMemory::new()))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_path(&self, path: &str) -> ObjectPath {
        if self.prefix.as_ref().is_empty() {
            ObjectPath::from(path)
        } else {
            ObjectPath::from(format!("{}/{}", self.prefix, path))
        }
    }

    /// Stores a JSON document, gzip-compressed unless `compress` is false.
    pub async fn store_json(
        &self,
        path: &str,
        data: &serde_json::Value,
        compress: bool,
    ) -> Result<StorageLocation> {
        let serialized = serde_json::to_vec(data)?;
        let (body, attributes) = if compress {
            let mut attributes = Attributes::new();
            attributes.insert(Attribute::ContentType, "text/plain".into());
            attributes.insert(Attribute::ContentEncoding, "gzip".into());
            (gzip_bytes(&serialized)?, attributes)
        } else {
            let mut attributes = Attributes::new();
            attributes.insert(Attribute::ContentType, "application/json".into());
            (serialized, attributes)
        };

        self.put(path, body, attributes).await
    }

    /// Uploads a local CSV file, gzip-compressed unless `compress` is false.
    pub async fn store_csv_file(
        &self,
        source_path: &Path,
        path: &str,
        compress: bool,
    ) -> Result<StorageLocation> {
        if !source_path.exists() {
            return Err(QuanterraError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Source file not found: {}", source_path.display()),
            )));
        }

        let contents = tokio::fs::read(source_path).await?;
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, "text/csv".into());

        let body = if compress {
            attributes.insert(Attribute::ContentEncoding, "gzip".into());
            gzip_bytes(&contents)?
        } else {
            contents
        };

        self.put(path, body, attributes).await
    }

    /// Copies a CSV object already in the bucket to a new path, compressing
    /// it on the way unless the source bytes are already gzip.
    pub async fn copy_csv_object(&self, source_path: &str, path: &str) -> Result<StorageLocation> {
        let contents = self.fetch(source_path).await?;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, "text/csv".into());
        attributes.insert(Attribute::ContentEncoding, "gzip".into());

        let body = if is_gzip(&contents) {
            contents
        } else {
            gzip_bytes(&contents)?
        };

        self.put(path, body, attributes).await
    }

    pub async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let result = self.store.get(&self.object_path(path)).await?;
        Ok(result.bytes().await?.to_vec())
    }

    async fn put(
        &self,
        path: &str,
        body: Vec<u8>,
        attributes: Attributes,
    ) -> Result<StorageLocation> {
        let size = body.len();
        let options = PutOptions {
            attributes,
            ..Default::default()
        };
        self.store
            .put_opts(&self.object_path(path), body.into(), options)
            .await?;

        let location = StorageLocation::new(&self.bucket, path);
        tracing::debug!("💾 Stored {} bytes at {}", size, location);
        Ok(location)
    }
}

fn gzip_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[..2] == GZIP_MAGIC
}
