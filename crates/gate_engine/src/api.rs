use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::settings::ClientSettings;
use crate::{
    ActivateRequest, ActivateResponse, ApiError, HeartbeatRequest, ValidateRequest,
    ValidateResponse,
};

const ACTIVATE_PATH: &str = "licenses/activate";
const VALIDATE_PATH: &str = "licenses/validate";
const HEARTBEAT_PATH: &str = "sessions/heartbeat";

/// Remote license authority.
#[async_trait::async_trait]
pub trait LicenseApi: Send + Sync {
    async fn activate(&self, request: &ActivateRequest) -> Result<ActivateResponse, ApiError>;

    async fn validate(&self, request: &ValidateRequest) -> Result<ValidateResponse, ApiError>;

    /// The response body is not consumed.
    async fn heartbeat(&self, request: &HeartbeatRequest) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestLicenseApi {
    client: reqwest::Client,
    base: Url,
}

impl ReqwestLicenseApi {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        let base = parse_base(&settings.api_base)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|err| ApiError::InvalidEndpoint(err.to_string()))
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<String, ApiError> {
        let url = self.endpoint(path)?;
        let payload = serde_json::to_vec(body).map_err(|err| ApiError::Decode(err.to_string()))?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status.as_u16()));
        }
        response.text().await.map_err(map_reqwest_error)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let text = self.post(path, body).await?;
        serde_json::from_str(&text).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[async_trait::async_trait]
impl LicenseApi for ReqwestLicenseApi {
    async fn activate(&self, request: &ActivateRequest) -> Result<ActivateResponse, ApiError> {
        self.post_json(ACTIVATE_PATH, request).await
    }

    async fn validate(&self, request: &ValidateRequest) -> Result<ValidateResponse, ApiError> {
        self.post_json(VALIDATE_PATH, request).await
    }

    async fn heartbeat(&self, request: &HeartbeatRequest) -> Result<(), ApiError> {
        self.post(HEARTBEAT_PATH, request).await.map(|_| ())
    }
}

/// Parses the API base and guarantees a trailing slash so joins append.
fn parse_base(raw: &str) -> Result<Url, ApiError> {
    let mut base = Url::parse(raw.trim())
        .map_err(|err| ApiError::InvalidEndpoint(format!("{raw}: {err}")))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(ApiError::InvalidEndpoint(format!(
            "{raw}: scheme must be http or https"
        )));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    if err.is_decode() {
        return ApiError::Decode(err.to_string());
    }
    ApiError::Network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_without_trailing_slash_keeps_its_path() {
        let base = parse_base("https://licenses.example/api").unwrap();
        assert_eq!(
            base.join(ACTIVATE_PATH).unwrap().as_str(),
            "https://licenses.example/api/licenses/activate"
        );
    }

    #[test]
    fn non_http_base_is_rejected() {
        assert!(matches!(
            parse_base("ftp://licenses.example"),
            Err(ApiError::InvalidEndpoint(_))
        ));
        assert!(parse_base("not a url").is_err());
    }
}
