use anyhow::{Result, bail};
use std::fmt;
use std::str::FromStr;

/// Parsed storage connection string.
///
/// The string is a `;`-separated list of `Key=Value` pairs:
/// ```text
/// Region=ap-southeast-2;Endpoint=http://localhost:9000;AccessKeyId=minio;SecretAccessKey=secret
/// ```
/// Every key is optional; an empty string means "use the ambient AWS
/// configuration". Keys are case-insensitive.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StorageConnection {
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl StorageConnection {
    /// Returns the static key pair, if the connection string carries one.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

impl FromStr for StorageConnection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut conn = StorageConnection::default();

        for segment in s.split(';').map(str::trim).filter(|seg| !seg.is_empty()) {
            let Some((key, value)) = segment.split_once('=') else {
                bail!("connection string segment '{segment}' is not Key=Value");
            };
            let value = value.trim();
            if value.is_empty() {
                bail!("connection string key '{}' has an empty value", key.trim());
            }
            let slot = match key.trim().to_ascii_lowercase().as_str() {
                "endpoint" => &mut conn.endpoint,
                "region" => &mut conn.region,
                "accesskeyid" => &mut conn.access_key_id,
                "secretaccesskey" => &mut conn.secret_access_key,
                other => bail!("unknown connection string key '{other}'"),
            };
            *slot = Some(value.to_string());
        }

        if conn.access_key_id.is_some() != conn.secret_access_key.is_some() {
            bail!("AccessKeyId and SecretAccessKey must be given together");
        }

        if let Some(endpoint) = conn.endpoint.as_mut() {
            let trimmed = endpoint.trim_end_matches('/').len();
            endpoint.truncate(trimmed);
        }

        Ok(conn)
    }
}

impl fmt::Debug for StorageConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConnection")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
