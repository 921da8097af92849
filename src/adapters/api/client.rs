use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::dto::ErrorDto;
use crate::ports::{RepositoryError, RepositoryResult};

#[derive(Clone)]
pub struct PtmsClient {
    client: Client,
    base_url: String,
}

impl PtmsClient {
    pub fn new(base_url: &str, timeout_seconds: u64) -> RepositoryResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("ptms/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RepositoryError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> RepositoryResult<T> {
        let request = self.client.get(self.url(path));
        self.send(request).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> RepositoryResult<T> {
        let request = self.client.post(self.url(path)).json(body);
        self.send(request).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> RepositoryResult<T> {
        let request = self.client.patch(self.url(path)).json(body);
        self.send(request).await
    }

    /// Deletes return a confirmation message that callers have no use for.
    pub async fn delete(&self, path: &str) -> RepositoryResult<()> {
        let request = self.client.delete(self.url(path));
        let _: serde_json::Value = self.send(request).await?;
        Ok(())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> RepositoryResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> RepositoryResult<T> {
        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        match status.as_u16() {
            200..=299 => {
                tracing::debug!("API Response: {}", response_text);

                serde_json::from_str(&response_text).map_err(|e| {
                    RepositoryError::Serialization(format!(
                        "Failed to parse response: {}. Response was: {}",
                        e, response_text
                    ))
                })
            }
            404 => Err(RepositoryError::NotFound(error_message(&response_text))),
            code => Err(RepositoryError::Api {
                status: code,
                message: error_message(&response_text),
            }),
        }
    }
}

/// The API reports failures as `{"error": "..."}`; anything else is passed
/// through verbatim.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorDto>(body) {
        Ok(dto) => dto.error,
        Err(_) if body.is_empty() => "Unknown error".to_string(),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = PtmsClient::new("http://localhost:3000/api/", 5).unwrap();
        assert_eq!(client.url("/projects"), "http://localhost:3000/api/projects");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"error":"Failed to update task"}"#), "Failed to update task");
        assert_eq!(error_message("gateway down"), "gateway down");
        assert_eq!(error_message(""), "Unknown error");
    }
}
