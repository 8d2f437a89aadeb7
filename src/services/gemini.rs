//! Gemini `generateContent` client used as the production [`ContentProvider`].

use crate::models::{ApiSettings, OPTIONS_PER_QUESTION, Question};
use crate::services::provider::{ContentProvider, ProviderError};
use async_trait::async_trait;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::LazyLock;
use std::time::Duration;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```(?:json)?\s*(.*?)\s*```$").expect("code fence pattern is valid")
});

/// Content provider backed by the Gemini REST API
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    settings: ApiSettings,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, settings: ApiSettings) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            settings,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn generate(&self, model: &str, body: Value) -> Result<GenerateResponse, ProviderError> {
        let url = self.endpoint(model);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!("Gemini request to {} failed with {}", model, status);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ContentProvider for GeminiProvider {
    async fn fetch_questions(&self, subject: &str) -> Result<Vec<Question>, ProviderError> {
        tracing::info!("Requesting quiz for subject '{}'", subject);

        let response = self
            .generate(&self.settings.quiz_model, quiz_request_body(subject))
            .await?;
        let text = response.first_text().ok_or_else(|| {
            ProviderError::UnexpectedFormat("no text part in the first candidate".to_string())
        })?;

        let questions = parse_quiz_text(text)?;
        tracing::info!("Received {} questions for '{}'", questions.len(), subject);
        Ok(questions)
    }

    async fn fetch_welcome_audio(&self, student_name: &str) -> Result<String, ProviderError> {
        tracing::info!("Requesting welcome audio");

        let body = speech_request_body(student_name, &self.settings.voice_name);
        let response = self.generate(&self.settings.speech_model, body).await?;

        response
            .first_inline_data()
            .map(str::to_string)
            .ok_or(ProviderError::MissingAudio)
    }
}

/// Prompt asking for 30 grade-2 questions of increasing difficulty.
pub fn quiz_prompt(subject: &str) -> String {
    format!(
        "Tạo một bài kiểm tra trắc nghiệm gồm 30 câu hỏi cho môn học '{}' dành cho học sinh lớp 2 tại Việt Nam. \
         Các câu hỏi cần tăng dần độ khó từ dễ đến khó. Mỗi câu hỏi có 4 phương án (A, B, C, D) và chỉ có một đáp án đúng. \
         Ngôn ngữ phải đơn giản, rõ ràng, phù hợp với lứa tuổi.",
        subject
    )
}

/// Prompt for the spoken greeting, read in a warm northern female voice.
pub fn welcome_prompt(student_name: &str) -> String {
    format!(
        "Hãy nói với giọng nữ miền Bắc trầm ấm, tình cảm như một cô giáo: \
         \"Chào mừng bé {} đến với lớp học vui vẻ. Chúc con làm bài thật tốt nhé!\"",
        student_name
    )
}

fn quiz_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "questions": {
                "type": "ARRAY",
                "description": "Một danh sách 30 câu hỏi trắc nghiệm.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "questionText": {
                            "type": "STRING",
                            "description": "Nội dung câu hỏi."
                        },
                        "options": {
                            "type": "ARRAY",
                            "description": "Một mảng chứa 4 phương án trả lời.",
                            "minItems": OPTIONS_PER_QUESTION,
                            "maxItems": OPTIONS_PER_QUESTION,
                            "items": { "type": "STRING" }
                        },
                        "correctAnswer": {
                            "type": "STRING",
                            "description": "Đáp án đúng, phải khớp chính xác với một trong các phương án."
                        }
                    },
                    "required": ["questionText", "options", "correctAnswer"]
                }
            }
        }
    })
}

pub fn quiz_request_body(subject: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": quiz_prompt(subject) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": quiz_response_schema()
        }
    })
}

pub fn speech_request_body(student_name: &str, voice_name: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": welcome_prompt(student_name) }] }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": {
                    "prebuiltVoiceConfig": { "voiceName": voice_name }
                }
            }
        }
    })
}

/// Parse the model's JSON text into questions.
///
/// Accepts the bare object or one wrapped in a Markdown code fence. The object
/// must carry a `questions` array.
pub fn parse_quiz_text(text: &str) -> Result<Vec<Question>, ProviderError> {
    let trimmed = text.trim();
    let json_text = CODE_FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    let value: Value = serde_json::from_str(json_text)?;
    match value.get("questions") {
        Some(Value::Array(items)) => Ok(serde_json::from_value(Value::Array(items.clone()))?),
        _ => Err(ProviderError::UnexpectedFormat(
            "missing 'questions' array".to_string(),
        )),
    }
}

/// Subset of the `generateContent` response we read
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: Option<String>,
    pub data: String,
}

impl GenerateResponse {
    fn first_part(&self) -> Option<&Part> {
        self.candidates.first()?.content.as_ref()?.parts.first()
    }

    pub fn first_text(&self) -> Option<&str> {
        self.first_part()?.text.as_deref()
    }

    pub fn first_inline_data(&self) -> Option<&str> {
        self.first_part()?
            .inline_data
            .as_ref()
            .map(|d| d.data.as_str())
    }
}
