//! YandexGPT client: IAM token exchange and chat completion

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{AuthToken, LanguageModel};
use crate::core::config;
use crate::core::error::{AppError, AppResult};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IamRequest<'a> {
    yandex_passport_oauth_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IamResponse {
    iam_token: String,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest<'a> {
    model_uri: String,
    completion_options: CompletionOptions,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    result: Option<CompletionResult>,
}

#[derive(Deserialize)]
struct CompletionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    message: Option<AlternativeMessage>,
}

#[derive(Deserialize)]
struct AlternativeMessage {
    text: Option<String>,
}

pub struct YandexGpt {
    http: Client,
    oauth_token: SecretString,
    folder_id: String,
    iam_url: String,
    api_url: String,
    cached_token: Mutex<Option<AuthToken>>,
}

impl YandexGpt {
    pub fn new(
        http: Client,
        oauth_token: SecretString,
        folder_id: impl Into<String>,
        iam_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            oauth_token,
            folder_id: folder_id.into(),
            iam_url: iam_url.into(),
            api_url: api_url.into(),
            cached_token: Mutex::new(None),
        }
    }

    /// Builds a client from the environment, `None` if credentials are missing
    pub fn from_env() -> AppResult<Option<Self>> {
        let (Some(oauth), Some(folder)) = (config::llm::OAUTH_TOKEN.as_ref(), config::llm::FOLDER_ID.as_ref()) else {
            return Ok(None);
        };

        let http = Client::builder().timeout(config::llm::timeout()).build()?;
        Ok(Some(Self::new(
            http,
            SecretString::from(oauth.clone()),
            folder.clone(),
            config::llm::IAM_URL.as_str(),
            config::llm::API_URL.as_str(),
        )))
    }

    fn model_uri(&self) -> String {
        format!("gpt://{}/yandexgpt", self.folder_id)
    }

    async fn fresh_cached_token(&self) -> Option<AuthToken> {
        let cached = self.cached_token.lock().await;
        cached
            .as_ref()
            .filter(|token| token.is_fresh(Utc::now(), config::llm::TOKEN_REFRESH_MARGIN_SECS))
            .cloned()
    }

    async fn request_token(&self) -> AppResult<AuthToken> {
        let body = IamRequest {
            yandex_passport_oauth_token: self.oauth_token.expose_secret(),
        };

        let response: IamResponse = self
            .http
            .post(&self.iam_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.iam_token.is_empty() {
            return Err(AppError::ExternalService("IAM endpoint returned an empty token".to_string()));
        }

        log::debug!("Fetched IAM token (expires at {:?})", response.expires_at);
        Ok(AuthToken::new(response.iam_token, response.expires_at))
    }
}

#[async_trait]
impl LanguageModel for YandexGpt {
    async fn fetch_auth_token(&self) -> AppResult<AuthToken> {
        if let Some(token) = self.fresh_cached_token().await {
            return Ok(token);
        }

        // The exchange runs unlocked; concurrent callers may each fetch once
        let token = self.request_token().await?;

        let mut cached = self.cached_token.lock().await;
        if let Some(current) = cached.as_ref() {
            if current.is_fresh(Utc::now(), config::llm::TOKEN_REFRESH_MARGIN_SECS) {
                return Ok(current.clone());
            }
        }
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn ask(&self, text: &str, token: &AuthToken) -> AppResult<String> {
        let body = CompletionRequest {
            model_uri: self.model_uri(),
            completion_options: CompletionOptions {
                temperature: config::llm::TEMPERATURE,
                max_tokens: config::llm::MAX_TOKENS,
            },
            messages: [
                ChatMessage {
                    role: "system",
                    text: config::llm::SYSTEM_PROMPT,
                },
                ChatMessage { role: "user", text },
            ],
        };

        let response: CompletionResponse = self
            .http
            .post(&self.api_url)
            .bearer_auth(token.expose())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .result
            .and_then(|r| r.alternatives.into_iter().next())
            .and_then(|a| a.message)
            .and_then(|m| m.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::ExternalService("completion response has no answer text".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> YandexGpt {
        YandexGpt::new(
            Client::new(),
            SecretString::from("oauth-secret".to_string()),
            "folder-1",
            format!("{}/iam", server.uri()),
            format!("{}/completion", server.uri()),
        )
    }

    fn in_one_hour() -> String {
        (Utc::now() + chrono::Duration::hours(1)).to_rfc3339()
    }

    #[tokio::test]
    async fn test_token_is_fetched_once_and_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/iam"))
            .and(body_string_contains("oauth-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "iamToken": "iam-1",
                "expiresAt": in_one_hour(),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let first = client.fetch_auth_token().await.unwrap();
        let second = client.fetch_auth_token().await.unwrap();

        assert_eq!(first.expose(), "iam-1");
        assert_eq!(second.expose(), "iam-1");
    }

    #[tokio::test]
    async fn test_token_exchange_does_not_hold_the_cache_lock() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/iam"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"iamToken": "iam-slow", "expiresAt": in_one_hour()}))
                    .set_delay(std::time::Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (token, lock_free) = tokio::join!(client.fetch_auth_token(), async {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            client.cached_token.try_lock().is_ok()
        });

        assert!(lock_free);
        assert_eq!(token.unwrap().expose(), "iam-slow");
        assert!(client.cached_token.lock().await.is_some());
    }

    #[tokio::test]
    async fn test_ask_sends_bearer_and_extracts_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/completion"))
            .and(header("Authorization", "Bearer iam-1"))
            .and(body_string_contains("gpt://folder-1/yandexgpt"))
            .and(body_string_contains("What is a gerund?"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "alternatives": [
                        {"message": {"role": "assistant", "text": "A verb form used as a noun."}, "status": "ALTERNATIVE_STATUS_FINAL"}
                    ]
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let token = AuthToken::new("iam-1", None);
        let answer = client.ask("What is a gerund?", &token).await.unwrap();

        assert_eq!(answer, "A verb form used as a noun.");
    }

    #[tokio::test]
    async fn test_missing_answer_is_external_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/completion"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {"alternatives": []}})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.ask("hi", &AuthToken::new("iam-1", None)).await;

        assert!(matches!(result, Err(AppError::ExternalService(_))));
    }

    #[tokio::test]
    async fn test_http_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/iam"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(client.fetch_auth_token().await, Err(AppError::Http(_))));
    }
}
