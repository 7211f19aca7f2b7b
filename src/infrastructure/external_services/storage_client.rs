use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::env;
use std::time::Duration;
use uuid::Uuid;

use crate::application::ports::object_storage::{ObjectStorage, ObjectStorageError};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct S3StorageConfig {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom endpoint (MinIO, LocalStack, etc.); AWS virtual-hosted style
    /// when absent.
    pub endpoint_url: Option<String>,
    pub key_prefix: String,
}

impl S3StorageConfig {
    pub fn from_env() -> Option<Self> {
        let bucket = env::var("S3_BUCKET").ok()?;
        let access_key_id = env::var("AWS_ACCESS_KEY_ID").ok()?;
        let secret_access_key = env::var("AWS_SECRET_ACCESS_KEY").ok()?;
        let region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let endpoint_url = env::var("S3_ENDPOINT_URL").ok();
        let key_prefix = env::var("S3_KEY_PREFIX").unwrap_or_else(|_| "documents/".to_string());

        Some(Self {
            bucket,
            region,
            access_key_id,
            secret_access_key,
            endpoint_url,
            key_prefix,
        })
    }
}

/// S3-compatible object storage over the REST API with AWS SigV4 signing:
/// header-signed PUT for uploads, query-signed URLs for short-lived GETs.
pub struct S3ObjectStorage {
    client: Client,
    config: S3StorageConfig,
}

impl S3ObjectStorage {
    pub fn new(config: S3StorageConfig) -> Result<Self, ObjectStorageError> {
        if config.bucket.trim().is_empty() {
            return Err(ObjectStorageError::Configuration(
                "S3 bucket is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ObjectStorageError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Option<Result<Self, ObjectStorageError>> {
        S3StorageConfig::from_env().map(Self::new)
    }

    fn host(&self) -> String {
        match &self.config.endpoint_url {
            Some(endpoint) => endpoint
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/')
                .to_string(),
            None => format!(
                "{}.s3.{}.amazonaws.com",
                self.config.bucket, self.config.region
            ),
        }
    }

    fn object_uri(&self, key: &str) -> String {
        let encoded_key = uri_encode_path(key);
        match &self.config.endpoint_url {
            // Path-style addressing for custom endpoints.
            Some(_) => format!("/{}/{}", self.config.bucket, encoded_key),
            None => format!("/{}", encoded_key),
        }
    }

    fn object_key(&self, file_name: &str) -> String {
        format!(
            "{}{}-{}",
            self.config.key_prefix,
            Uuid::new_v4(),
            sanitize_file_name(file_name)
        )
    }

    fn credential_scope(&self, date_stamp: &str) -> String {
        format!("{}/{}/s3/aws4_request", date_stamp, self.config.region)
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn upload_file(
        &self,
        data: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> Result<String, ObjectStorageError> {
        let key = self.object_key(file_name);
        let host = self.host();
        let uri = self.object_uri(&key);

        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let payload_hash = hex_sha256(data);

        let mut headers = vec![
            ("content-type".to_string(), mime_type.to_string()),
            ("host".to_string(), host.clone()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        let signed_headers: String = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v))
            .collect();

        let canonical_request = format!(
            "PUT\n{}\n\n{}\n{}\n{}",
            uri, canonical_headers, signed_headers, payload_hash
        );

        let credential_scope = self.credential_scope(&date_stamp);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key = derive_signing_key(
            &self.config.secret_access_key,
            &date_stamp,
            &self.config.region,
            "s3",
        );
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.config.access_key_id, credential_scope, signed_headers, signature
        );

        let url = format!("https://{}{}", host, uri);

        let response = self
            .client
            .put(&url)
            .header("Authorization", authorization)
            .header("Content-Type", mime_type)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &amz_date)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| ObjectStorageError::NetworkError(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ObjectStorageError::UploadFailed(format!(
                "S3 PUT failed (HTTP {}): {}",
                status,
                body.chars().take(300).collect::<String>()
            )));
        }

        Ok(key)
    }

    async fn presigned_url(
        &self,
        key: &str,
        ttl_secs: u64,
    ) -> Result<String, ObjectStorageError> {
        let host = self.host();
        let uri = self.object_uri(key);

        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let credential_scope = self.credential_scope(&date_stamp);
        let credential = format!("{}/{}", self.config.access_key_id, credential_scope);

        // Already in canonical (sorted) order.
        let query_params = vec![
            ("X-Amz-Algorithm".to_string(), "AWS4-HMAC-SHA256".to_string()),
            ("X-Amz-Credential".to_string(), credential),
            ("X-Amz-Date".to_string(), amz_date.clone()),
            ("X-Amz-Expires".to_string(), ttl_secs.to_string()),
            ("X-Amz-SignedHeaders".to_string(), "host".to_string()),
        ];

        let canonical_querystring: String = query_params
            .iter()
            .map(|(k, v)| format!("{}={}", uri_encode(k), uri_encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request = format!(
            "GET\n{}\n{}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
            uri, canonical_querystring, host
        );

        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key = derive_signing_key(
            &self.config.secret_access_key,
            &date_stamp,
            &self.config.region,
            "s3",
        );
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        Ok(format!(
            "https://{}{}?{}&X-Amz-Signature={}",
            host, uri, canonical_querystring, signature
        ))
    }
}

/// Compute the hex-encoded SHA-256 hash of data.
fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute HMAC-SHA256 of data with the given key.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Compute hex-encoded HMAC-SHA256.
fn hex_hmac_sha256(key: &[u8], data: &[u8]) -> String {
    hex::encode(hmac_sha256(key, data))
}

/// Derive the AWS SigV4 signing key for a given date, region, and service.
///
/// ```text
/// kDate    = HMAC("AWS4" + secret, dateStamp)
/// kRegion  = HMAC(kDate, region)
/// kService = HMAC(kRegion, service)
/// kSigning = HMAC(kService, "aws4_request")
/// ```
fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// URI-encode a string per RFC 3986: everything except unreserved
/// characters `A-Z a-z 0-9 - _ . ~`.
fn uri_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

/// URI-encode an object key for the canonical URI: path separators stay
/// literal, every other reserved byte is percent-encoded.
fn uri_encode_path(s: &str) -> String {
    s.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> S3StorageConfig {
        S3StorageConfig {
            bucket: "docs".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: "AKIAEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            endpoint_url: None,
            key_prefix: "documents/".to_string(),
        }
    }

    #[test]
    fn test_uri_encoding() {
        assert_eq!(uri_encode("abc-123_~.ok"), "abc-123_~.ok");
        assert_eq!(uri_encode("a b/c"), "a%20b%2Fc");
        assert_eq!(uri_encode_path("documents/a b.pdf"), "documents/a%20b.pdf");
    }

    #[test]
    fn test_file_name_sanitized_in_key() {
        let storage = S3ObjectStorage::new(test_config()).unwrap();
        let key = storage.object_key("weird name (1).pdf");

        assert!(key.starts_with("documents/"));
        assert!(key.ends_with("weird_name__1_.pdf"));
        assert!(!key.contains(' '));
    }

    #[test]
    fn test_virtual_hosted_and_path_style() {
        let storage = S3ObjectStorage::new(test_config()).unwrap();
        assert_eq!(storage.host(), "docs.s3.us-east-1.amazonaws.com");
        assert_eq!(storage.object_uri("documents/x.pdf"), "/documents/x.pdf");

        let mut config = test_config();
        config.endpoint_url = Some("http://localhost:9000/".to_string());
        let storage = S3ObjectStorage::new(config).unwrap();
        assert_eq!(storage.host(), "localhost:9000");
        assert_eq!(
            storage.object_uri("documents/x.pdf"),
            "/docs/documents/x.pdf"
        );
    }

    #[tokio::test]
    async fn test_presigned_url_shape() {
        let storage = S3ObjectStorage::new(test_config()).unwrap();
        let url = storage
            .presigned_url("documents/abc-report.pdf", 900)
            .await
            .unwrap();

        assert!(url.starts_with("https://docs.s3.us-east-1.amazonaws.com/documents/abc-report.pdf?"));
        assert!(url.contains("X-Amz-Algorithm=AWS4-HMAC-SHA256"));
        assert!(url.contains("X-Amz-Expires=900"));
        assert!(url.contains("X-Amz-SignedHeaders=host"));
        assert!(url.contains("&X-Amz-Signature="));
    }

    #[test]
    fn test_signing_key_derivation_is_deterministic() {
        let first = derive_signing_key("secret", "20250510", "us-east-1", "s3");
        let second = derive_signing_key("secret", "20250510", "us-east-1", "s3");
        let other = derive_signing_key("secret", "20250511", "us-east-1", "s3");

        assert_eq!(first, second);
        assert_ne!(first, other);
    }
}
