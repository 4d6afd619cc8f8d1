//! チャット補完API連携モジュール
//!
//! OpenAI互換の `/chat/completions` にプロンプトと画像（Data URL）を送り、
//! 返答テキストをそのまま返す。1回の呼び出しのみ、リトライなし。
//! タイムアウトは `Config::timeout_seconds`。

use super::{VisionClient, VisionRequest};
use crate::config::Config;
use crate::error::{LeafDoctorError, Result};
use async_trait::async_trait;
use leaf_doctor_common::excerpt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// エラーメッセージに含めるレスポンス本文の最大文字数
const ERROR_BODY_LIMIT: usize = 500;

/// チャット補完APIリクエスト
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_completion_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

/// チャット補完APIレスポンス
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// OpenAI互換APIクライアント（デフォルトはGroq）
pub struct ChatApiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_completion_tokens: u32,
}

impl ChatApiClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.get_api_key()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LeafDoctorError::ApiCall(format!("HTTPクライアントの初期化に失敗: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.api_base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_completion_tokens: config.max_completion_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// リクエストボディ構築
    pub fn build_request_body<'a>(&'a self, request: &'a VisionRequest<'a>) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: request.prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: request.image.data_url() },
                    },
                ],
            }],
            temperature: self.temperature,
            max_completion_tokens: self.max_completion_tokens,
            top_p: 1.0,
            stream: false,
        }
    }
}

#[async_trait]
impl VisionClient for ChatApiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &VisionRequest<'_>) -> Result<String> {
        let body = self.build_request_body(request);

        debug!(endpoint = %self.endpoint, model = %self.model, "ビジョンAPIへリクエスト送信");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LeafDoctorError::ApiCall(format!("リクエスト送信に失敗: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LeafDoctorError::ApiCall(format!("レスポンス読み込みに失敗: {}", e)))?;

        if !status.is_success() {
            return Err(LeafDoctorError::ApiCall(format!(
                "status {}: {}",
                status,
                excerpt(&text, ERROR_BODY_LIMIT)
            )));
        }

        extract_reply_text(&text)
    }
}

/// レスポンス本文から `choices[0].message.content` を取り出す
pub fn extract_reply_text(body: &str) -> Result<String> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| LeafDoctorError::ApiParse(format!("レスポンス形式が不正: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LeafDoctorError::ApiParse("レスポンスに返答テキストがありません".into()))
}
