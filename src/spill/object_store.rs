//! S3-compatible object store spill adapter.
//!
//! Artifacts are objects in one bucket, optionally under a key prefix. Works
//! with AWS S3 and with self-hosted stores (MinIO, R2, ...) through a custom
//! endpoint and path-style addressing.

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::config::DEFAULT_S3_REGION;
use crate::error_handling::StorageError;

use super::naming;
use super::options::*;
use super::DataAdapter;

/// Spill adapter storing artifacts as objects in an S3 bucket.
#[derive(Debug, Default)]
pub struct S3Adapter {
    client: Option<Client>,
    bucket: String,
    prefix: String,
}

/// Prepends a scheme to a bare `host[:port]` endpoint.
fn endpoint_url(endpoint: &str, use_ssl: bool) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else if use_ssl {
        format!("https://{endpoint}")
    } else {
        format!("http://{endpoint}")
    }
}

fn object_store_error<E>(op: &'static str, key: &str, error: E) -> StorageError
where
    E: std::error::Error,
{
    StorageError::ObjectStore {
        op,
        key: key.to_string(),
        message: DisplayErrorContext(error).to_string(),
    }
}

impl S3Adapter {
    fn client(&self) -> Result<&Client, StorageError> {
        self.client.as_ref().ok_or(StorageError::NotInitialized)
    }

    fn key_of(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Bucket artifacts are stored in.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl DataAdapter for S3Adapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::S3
    }

    async fn init(&mut self, options: &AdapterOptions) -> Result<(), StorageError> {
        if self.client.is_some() {
            return Ok(());
        }

        let bucket = options.require(KEY_S3_BUCKET)?.to_string();
        let endpoint = options.require(KEY_S3_ENDPOINT)?;
        let access_key = options.require(KEY_S3_ACCESS_KEY)?;
        let secret_key = options.require(KEY_S3_SECRET_KEY)?;
        let use_ssl = options.get_bool(KEY_S3_USE_SSL, true)?;
        let region = options.get(KEY_S3_REGION).unwrap_or(DEFAULT_S3_REGION);

        let credentials = Credentials::new(access_key, secret_key, None, None, "spillway");
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .endpoint_url(endpoint_url(endpoint, use_ssl))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        log::info!("Using S3 spill store: endpoint={}, bucket={}", endpoint, bucket);

        self.client = Some(Client::from_conf(config));
        self.bucket = bucket;
        self.prefix = options.get(KEY_S3_PREFIX).unwrap_or_default().to_string();
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let client = self.client()?;
        let mut names = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&self.prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| object_store_error("list", &self.bucket, e))?;

            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                let name = key.strip_prefix(self.prefix.as_str()).unwrap_or(key);
                if naming::is_artifact(name) && !name.contains('/') {
                    names.push(name.to_string());
                }
            }

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(names)
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let key = self.key_of(name);
        let object = self
            .client()?
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| object_store_error("get", &key, e))?;

        let body = object
            .body
            .collect()
            .await
            .map_err(|e| object_store_error("get", &key, e))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let key = self.key_of(name);
        self.client()?
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("application/octet-stream")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| object_store_error("put", &key, e))?;
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let key = self.key_of(name);
        self.client()?
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| object_store_error("delete", &key, e))?;
        Ok(())
    }
}
