//! Thin client for the OpenAI Assistants v2 REST API
//!
//! Only the handful of endpoints note generation needs: assistants, threads,
//! messages and runs. Every request carries the bearer key and the
//! `OpenAI-Beta: assistants=v2` header the API requires.

use super::NoteError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Deserialize)]
pub struct Assistant {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: Vec<MessageContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<MessageText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageText {
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
}

#[derive(Debug, Serialize)]
struct CreateAssistantRequest<'a> {
    name: &'a str,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
}

pub struct AssistantClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AssistantClient {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self, NoteError> {
        if api_key.trim().is_empty() {
            return Err(NoteError::MissingApiKey);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, NoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NoteError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    pub async fn list_assistants(&self) -> Result<Vec<Assistant>, NoteError> {
        let response = self
            .request(reqwest::Method::GET, "/assistants")
            .query(&[("limit", "100")])
            .send()
            .await?;
        let list: ListResponse<Assistant> = Self::decode(response).await?;
        Ok(list.data)
    }

    pub async fn create_assistant(
        &self,
        name: &str,
        model: &str,
        instructions: Option<&str>,
    ) -> Result<Assistant, NoteError> {
        let response = self
            .request(reqwest::Method::POST, "/assistants")
            .json(&CreateAssistantRequest {
                name,
                model,
                instructions,
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Return the assistant with the given name, creating it if absent.
    pub async fn ensure_assistant(
        &self,
        name: &str,
        model: &str,
        instructions: Option<&str>,
    ) -> Result<Assistant, NoteError> {
        let assistants = self.list_assistants().await?;
        if let Some(existing) = assistants
            .into_iter()
            .find(|a| a.name.as_deref() == Some(name))
        {
            info!("Reusing existing assistant '{}' ({})", name, existing.id);
            return Ok(existing);
        }
        let created = self.create_assistant(name, model, instructions).await?;
        info!("Created assistant '{}' ({})", name, created.id);
        Ok(created)
    }

    pub async fn create_thread(&self) -> Result<Thread, NoteError> {
        let response = self
            .request(reqwest::Method::POST, "/threads")
            .json(&json!({}))
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn add_message(&self, thread_id: &str, content: &str) -> Result<(), NoteError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/threads/{}/messages", thread_id),
            )
            .json(&json!({ "role": "user", "content": content }))
            .send()
            .await?;
        let _: serde_json::Value = Self::decode(response).await?;
        Ok(())
    }

    pub async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, NoteError> {
        let response = self
            .request(reqwest::Method::POST, &format!("/threads/{}/runs", thread_id))
            .json(&json!({ "assistant_id": assistant_id }))
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn run_status(&self, thread_id: &str, run_id: &str) -> Result<Run, NoteError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/threads/{}/runs/{}", thread_id, run_id),
            )
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Text of the newest assistant message in the thread, if any.
    pub async fn latest_assistant_message(
        &self,
        thread_id: &str,
    ) -> Result<Option<String>, NoteError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/threads/{}/messages", thread_id),
            )
            .query(&[("order", "desc"), ("limit", "20")])
            .send()
            .await?;
        let list: ListResponse<Message> = Self::decode(response).await?;
        Ok(extract_latest_assistant_text(&list.data))
    }
}

/// First assistant-authored text value in a newest-first message list.
pub fn extract_latest_assistant_text(messages: &[Message]) -> Option<String> {
    messages
        .iter()
        .filter(|m| m.role == "assistant")
        .flat_map(|m| m.content.iter())
        .filter(|c| c.kind == "text")
        .find_map(|c| c.text.as_ref().map(|t| t.value.clone()))
}
