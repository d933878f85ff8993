//! Backblaze B2 object storage client.
//!
//! Uploading is a three-stage protocol: authorize the account (Basic auth,
//! yields a short-lived API endpoint and bearer token), request a
//! bucket-scoped upload URL (yields a single-use upload token), then POST
//! the payload with its SHA-1 so the service can verify integrity
//! server-side. Credentials are session-scoped; every upload runs all three
//! stages. The client performs no retries of its own.

use serde::Deserialize;
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;

/// Value sent as the `X-Bz-Info-Author` attribution tag.
pub const AUTHOR_TAG: &str = "bookmark-archiver";

/// MIME type used when resolution produced none; tells B2 to sniff.
pub const AUTO_CONTENT_TYPE: &str = "b2/x-auto";

/// Protocol stage identifiers carried by every [`StorageError`].
pub const STAGE_AUTHORIZE: &str = "authorize_account";
pub const STAGE_UPLOAD_URL: &str = "get_upload_url";
pub const STAGE_UPLOAD: &str = "upload_file";

#[derive(Debug, Error)]
pub enum StorageError {
    /// The request never produced a usable response.
    #[error("{stage}: request failed: {source}")]
    Transport {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The service reported a structured error body.
    #[error("{stage}: service error {status} {code}: {message}")]
    Service {
        stage: &'static str,
        status: u16,
        code: String,
        message: String,
    },
    /// A response body (success or error) could not be decoded.
    #[error("{stage}: failed to decode response: {source}")]
    Decode {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Account-level authorization, valid for one archive operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAuth {
    pub api_url: String,
    pub authorization_token: String,
    pub download_url: String,
    #[serde(default)]
    pub recommended_part_size: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrlResponse {
    upload_url: String,
    authorization_token: String,
}

/// Single-use upload endpoint derived from an [`AccountAuth`].
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub upload_url: String,
    pub authorization_token: String,
    pub download_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    file_name: String,
    #[serde(default)]
    content_length: u64,
    #[serde(default)]
    content_sha1: String,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    status: u16,
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// The durable result of an upload.
#[derive(Debug, Clone)]
pub struct ArchivedObject {
    pub file_name: String,
    pub content_length: u64,
    pub content_sha1: String,
    pub public_url: String,
}

/// B2 client bound to one bucket.
#[derive(Debug, Clone)]
pub struct B2Client {
    http: reqwest::Client,
    api_url: String,
    key_id: String,
    app_key: String,
    bucket_id: String,
    bucket_name: String,
}

impl B2Client {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            http,
            api_url: config.b2_api_url.clone(),
            key_id: config.b2_key_id.clone(),
            app_key: config.b2_app_key.clone(),
            bucket_id: config.b2_bucket_id.clone(),
            bucket_name: config.b2_bucket_name.clone(),
        })
    }

    /// Stage 1: exchange the static key pair for a session authorization.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] carrying the `authorize_account` stage.
    pub async fn authorize_account(&self) -> Result<AccountAuth, StorageError> {
        let url = format!("{}/b2api/v2/b2_authorize_account", self.api_url);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.key_id, Some(&self.app_key))
            .send()
            .await
            .map_err(|source| StorageError::Transport {
                stage: STAGE_AUTHORIZE,
                source,
            })?;

        if !response.status().is_success() {
            return Err(decode_service_error(STAGE_AUTHORIZE, response).await);
        }

        response
            .json::<AccountAuth>()
            .await
            .map_err(|source| StorageError::Decode {
                stage: STAGE_AUTHORIZE,
                source,
            })
    }

    /// Stage 2: request a bucket-scoped upload endpoint and token.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] carrying the `get_upload_url` stage.
    pub async fn get_upload_url(&self, auth: &AccountAuth) -> Result<UploadSession, StorageError> {
        let url = format!("{}/b2api/v1/b2_get_upload_url", auth.api_url);
        let response = self
            .http
            .post(&url)
            .header("Authorization", &auth.authorization_token)
            .json(&serde_json::json!({ "bucketId": self.bucket_id }))
            .send()
            .await
            .map_err(|source| StorageError::Transport {
                stage: STAGE_UPLOAD_URL,
                source,
            })?;

        if !response.status().is_success() {
            return Err(decode_service_error(STAGE_UPLOAD_URL, response).await);
        }

        let body =
            response
                .json::<UploadUrlResponse>()
                .await
                .map_err(|source| StorageError::Decode {
                    stage: STAGE_UPLOAD_URL,
                    source,
                })?;

        Ok(UploadSession {
            upload_url: body.upload_url,
            authorization_token: body.authorization_token,
            download_url: auth.download_url.clone(),
        })
    }

    /// Upload a payload, running all three protocol stages.
    ///
    /// The SHA-1 of `data` is declared up front; the service recomputes it
    /// and rejects the upload on mismatch, which surfaces here as a
    /// `upload_file` stage service error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] identifying the failed stage.
    pub async fn upload(
        &self,
        data: &[u8],
        file_name: &str,
        content_type: &str,
    ) -> Result<ArchivedObject, StorageError> {
        let auth = self.authorize_account().await?;
        let session = self.get_upload_url(&auth).await?;

        let content_sha1 = payload_sha1(data);
        let content_type = if content_type.is_empty() {
            AUTO_CONTENT_TYPE
        } else {
            content_type
        };

        debug!(
            file = %file_name,
            bytes = data.len(),
            content_type = %content_type,
            "Uploading to B2"
        );

        let response = self
            .http
            .post(&session.upload_url)
            .header("Authorization", &session.authorization_token)
            .header("X-Bz-File-Name", file_name)
            .header("Content-Type", content_type)
            .header("Content-Length", data.len().to_string())
            .header("X-Bz-Content-Sha1", &content_sha1)
            .header("X-Bz-Info-Author", AUTHOR_TAG)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|source| StorageError::Transport {
                stage: STAGE_UPLOAD,
                source,
            })?;

        if !response.status().is_success() {
            return Err(decode_service_error(STAGE_UPLOAD, response).await);
        }

        let body = response
            .json::<UploadResponse>()
            .await
            .map_err(|source| StorageError::Decode {
                stage: STAGE_UPLOAD,
                source,
            })?;

        let public_url = format!(
            "{}/file/{}/{}",
            session.download_url, self.bucket_name, body.file_name
        );

        info!(file = %body.file_name, "Uploaded to B2");

        Ok(ArchivedObject {
            file_name: body.file_name,
            content_length: body.content_length,
            content_sha1: if body.content_sha1.is_empty() {
                content_sha1
            } else {
                body.content_sha1
            },
            public_url,
        })
    }
}

/// Hex SHA-1 of a payload, as declared in `X-Bz-Content-Sha1`.
#[must_use]
pub fn payload_sha1(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Decode a non-2xx response into a [`StorageError`].
///
/// The service reports errors as `{status, code, message}`; if that body
/// fails to decode, the decode failure is propagated instead of being
/// swallowed.
async fn decode_service_error(stage: &'static str, response: reqwest::Response) -> StorageError {
    let http_status = response.status().as_u16();
    match response.json::<ServiceErrorBody>().await {
        Ok(body) => StorageError::Service {
            stage,
            status: if body.status == 0 {
                http_status
            } else {
                body.status
            },
            code: body.code,
            message: body.message,
        },
        Err(source) => StorageError::Decode { stage, source },
    }
}
