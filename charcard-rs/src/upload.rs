//! Client for the portrait storage endpoint.

use log::{error, info};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::config::UploadConfig;
use crate::error::{CardError, CardResult};
use crate::image_loading::REQWEST_CLIENT;

/// Identifies the stored portrait slot of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub uid: String,
    pub md5: String,
}

/// What the server kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Stored file name, or `None` when the stored portrait was removed.
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    filename: Option<String>,
}

/// Uploads and clears stored card portraits.
#[derive(Debug, Clone)]
pub struct UploadClient {
    client: Client,
    api_base: String,
}

impl UploadClient {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            client: REQWEST_CLIENT.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, target: &UploadTarget) -> String {
        format!(
            "{}/api/user/cardpic/{}/{}",
            self.api_base,
            urlencoding::encode(&target.uid),
            urlencoding::encode(&target.md5)
        )
    }

    /// Public URL of a stored portrait.
    pub fn portrait_url(&self, filename: &str) -> String {
        format!("{}/public/cardpics/{}", self.api_base, filename)
    }

    /// Store `payload` as the portrait of `target`, or clear it when `payload` is `None`.
    ///
    /// A clear request carries no body and no content type. Failures are
    /// returned as [`CardError::Upload`] and never retried.
    pub async fn upload(
        &self,
        target: &UploadTarget,
        token: &str,
        payload: Option<Vec<u8>>,
        adaptive_bg: bool,
    ) -> CardResult<UploadOutcome> {
        let url = self.endpoint(target);
        let variant = if adaptive_bg { "adaptiveBg" } else { "" };
        let mut request = self
            .client
            .post(&url)
            .bearer_auth(token)
            .query(&[("variant", variant)]);

        match payload {
            Some(png) => {
                info!("Uploading {} byte portrait to {}", png.len(), url);
                let part = Part::bytes(png)
                    .file_name("cardpic.png")
                    .mime_str("image/png")
                    .map_err(|err| CardError::Upload(err.to_string()))?;
                request = request.multipart(Form::new().part("file", part));
            }
            None => info!("Clearing stored portrait at {}", url),
        }

        let response = request
            .send()
            .await
            .map_err(|err| CardError::Upload(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| CardError::Upload(err.to_string()))?;
        if !status.is_success() {
            error!(
                "Portrait upload to {} failed with status {}: {}",
                url,
                status,
                String::from_utf8_lossy(&body)
            );
            return Err(CardError::Upload(format!("server returned {status}")));
        }

        let parsed: UploadResponse = serde_json::from_slice(&body)
            .map_err(|err| CardError::Upload(format!("malformed response: {err}")))?;
        Ok(UploadOutcome {
            filename: parsed.filename.filter(|name| !name.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_and_portrait_url() {
        let client = UploadClient::new(&UploadConfig {
            api_base: "https://api.test/".to_string(),
            quality_factor: 2.0,
        });
        let target = UploadTarget {
            uid: "7 00".to_string(),
            md5: "abc".to_string(),
        };
        assert_eq!(
            client.endpoint(&target),
            "https://api.test/api/user/cardpic/7%2000/abc"
        );
        assert_eq!(
            client.portrait_url("x.png"),
            "https://api.test/public/cardpics/x.png"
        );
    }
}
