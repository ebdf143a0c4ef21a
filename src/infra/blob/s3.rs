use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use tracing::{debug, info};

use super::{BlobStore, StorageConnection};
use crate::error::{CallError, Result};

/// Uploads blobs to S3. The container name is used as the bucket.
pub struct S3BlobStore {
    client: Client,
    endpoint: Option<String>,
    region: Option<String>,
}

impl S3BlobStore {
    /// Builds a client from the connection string, falling back to the
    /// ambient AWS configuration (env vars, profile, instance role) for
    /// anything it leaves out.
    pub async fn connect(connection: &StorageConnection) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &connection.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some((id, secret)) = connection.credentials() {
            loader = loader.credentials_provider(Credentials::new(
                id,
                secret,
                None,
                None,
                "storage-connection-string",
            ));
        }
        let sdk_config = loader.load().await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &connection.endpoint {
            s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
        }

        let region = sdk_config.region().map(|r| r.to_string());
        info!(endpoint = ?connection.endpoint, region = ?region, "Initialized S3 blob store");

        Self {
            client: Client::from_conf(s3_config.build()),
            endpoint: connection.endpoint.clone(),
            region,
        }
    }

    /// Wraps an existing client. `connection` only supplies the endpoint used
    /// when building object addresses.
    pub fn from_client(client: Client, connection: &StorageConnection) -> Self {
        let region = client.config().region().map(|r| r.to_string());
        Self {
            client,
            endpoint: connection.endpoint.clone(),
            region,
        }
    }

    /// Address of `key` inside `container`.
    pub fn object_url(&self, container: &str, key: &str) -> String {
        if let Some(endpoint) = &self.endpoint {
            format!("{endpoint}/{container}/{key}")
        } else if let Some(region) = &self.region {
            format!("https://{container}.s3.{region}.amazonaws.com/{key}")
        } else {
            format!("https://{container}.s3.amazonaws.com/{key}")
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for S3BlobStore {
    async fn upload_text(&self, container: &str, key: &str, text: &str) -> Result<String> {
        self.client
            .put_object()
            .bucket(container)
            .key(key)
            .body(ByteStream::from(text.as_bytes().to_vec()))
            .content_type("text/plain; charset=utf-8")
            .send()
            .await
            .map_err(|e| {
                CallError::Storage(format!(
                    "PutObject {container}/{key} failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let url = self.object_url(container, key);
        debug!(url = %url, bytes = text.len(), "Uploaded blob");
        Ok(url)
    }
}
