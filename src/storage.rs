use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;

/// Upload links live for ten minutes; download links for one hour.
const UPLOAD_TTL: Duration = Duration::from_secs(600);
const DOWNLOAD_TTL: Duration = Duration::from_secs(3600);

/// MIME types accepted into the materials library.
pub const ALLOWED_MATERIAL_TYPES: [&str; 6] = [
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/png",
    "image/jpeg",
    "video/mp4",
];

pub fn is_allowed_material_type(content_type: &str) -> bool {
    ALLOWED_MATERIAL_TYPES.contains(&content_type)
}

// 1. StorageService Contract
/// StorageService
///
/// Object storage for material files. Files never pass through the portal:
/// admins upload and visitors download directly against the bucket with
/// short-lived presigned URLs.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the bucket if needed. Used at local startup against MinIO.
    async fn ensure_bucket_exists(&self);

    /// A presigned PUT URL for `key`, constrained to `content_type`.
    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, String>;

    /// A presigned GET URL for `key`.
    async fn presign_download(&self, key: &str) -> Result<String, String>;
}

// 2. The Real Implementation (S3/MinIO)
/// S3StorageClient
///
/// aws-sdk-s3 client in path-style mode, which MinIO and most S3-compatible
/// gateways require.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            // Already-exists answers land here too.
            tracing::debug!(error = %e, bucket = %self.bucket_name, "create_bucket did not succeed");
        }
    }

    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, String> {
        let presigning = PresigningConfig::expires_in(UPLOAD_TTL).map_err(|e| e.to_string())?;
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned.uri().to_string())
    }

    async fn presign_download(&self, key: &str) -> Result<String, String> {
        let presigning = PresigningConfig::expires_in(DOWNLOAD_TTL).map_err(|e| e.to_string())?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned.uri().to_string())
    }
}

/// sanitize_key
///
/// Drops empty, `.` and `..` segments so a caller-supplied key cannot climb
/// out of its prefix.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// Returns deterministic local-style URLs, or fails on demand.
#[derive(Clone, Default)]
pub struct MockStorageService {
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn presign_upload(&self, key: &str, _content_type: &str) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }
        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake&method=put",
            sanitize_key(key)
        ))
    }

    async fn presign_download(&self, key: &str) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }
        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake&method=get",
            sanitize_key(key)
        ))
    }
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;
