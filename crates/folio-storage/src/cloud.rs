use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
#[cfg(feature = "storage-s3")]
use object_store::aws::{AmazonS3, AmazonS3Builder};
#[cfg(feature = "storage-gcs")]
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};

/// Bucket-backed storage on top of an `object_store` implementation.
#[derive(Clone)]
pub struct CloudStorage<S> {
    store: S,
    bucket: String,
    backend: StorageBackend,
}

#[cfg(feature = "storage-s3")]
pub type S3Storage = CloudStorage<AmazonS3>;

#[cfg(feature = "storage-gcs")]
pub type GcsStorage = CloudStorage<GoogleCloudStorage>;

#[cfg(feature = "storage-s3")]
impl CloudStorage<AmazonS3> {
    /// Create an S3 store
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn s3(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::with_store(store, bucket, StorageBackend::S3))
    }
}

#[cfg(feature = "storage-gcs")]
impl CloudStorage<GoogleCloudStorage> {
    /// Create a Google Cloud Storage store. Credentials are taken from the
    /// environment (service account file or instance metadata).
    pub fn gcs(bucket: String) -> StorageResult<Self> {
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::with_store(store, bucket, StorageBackend::Gcs))
    }
}

impl<S: ObjectStore> CloudStorage<S> {
    pub fn with_store(store: S, bucket: String, backend: StorageBackend) -> Self {
        Self {
            store,
            bucket,
            backend,
        }
    }

    /// Archival reference for a key, e.g. `gs://bucket/uploads/u/file.pdf`
    fn reference(&self, key: &str) -> String {
        match self.backend.scheme() {
            Some(scheme) => format!("{}://{}/{}", scheme, self.bucket, key),
            None => format!("{}/{}", self.bucket, key),
        }
    }
}

#[async_trait]
impl<S: ObjectStore> Storage for CloudStorage<S> {
    #[tracing::instrument(skip(self, data), fields(
        storage.backend = %self.backend,
        storage.bucket = %self.bucket,
        storage.key = %storage_key,
        storage.size = data.len()
    ))]
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        let size = data.len() as u64;
        let location = Path::from(storage_key.to_string());
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(data), opts)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Archive upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Archive upload successful"
        );

        Ok(self.reference(storage_key))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Archive delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Archive delete successful"
        );

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let location = Path::from(storage_key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}
