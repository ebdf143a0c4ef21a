use super::client::HttpClient;
use async_trait::async_trait;
use std::time::Duration;

/// reqwest-backed transport.
///
/// Transparent decompression is switched off so `Content-Encoding: gzip`
/// bodies reach the extractor untouched.
#[derive(Debug, Clone)]
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .no_gzip()
            .timeout(Duration::from_secs(100))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self(client))
    }

    /// Wraps an already configured client. The caller is responsible for
    /// disabling automatic decompression on it.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self(client)
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
