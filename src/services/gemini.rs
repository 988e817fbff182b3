use anyhow::Result;
use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;
use crate::models::ImageFormat;
use crate::services::ai_service::AIService;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

pub struct GeminiService {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiService {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, client })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base, self.config.model
        )
    }

    fn build_request(prompt: &str, image: &[u8], format: ImageFormat) -> GenerateContentRequest {
        let base64_image = general_purpose::STANDARD.encode(image);

        log::debug!("📊 Image size: {} bytes", image.len());
        log::debug!("🔄 Base64 encoded size: {} bytes", base64_image.len());

        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::Text {
                        text: prompt.to_string(),
                    },
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: format.mime_type().to_string(),
                            data: base64_image,
                        },
                    },
                ],
            }],
        }
    }

    /// Text parts of the first candidate, joined as-is. `None` if that is empty.
    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let parts = &response.candidates.first()?.content.as_ref()?.parts;

        let text: String = parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait::async_trait]
impl AIService for GeminiService {
    async fn analyze_food_image(
        &self,
        prompt: &str,
        image: &[u8],
        format: ImageFormat,
    ) -> Result<Option<String>> {
        let request = Self::build_request(prompt, image, format);

        log::info!("🤖 Sending request to Gemini with model: {}", self.config.model);

        let response = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, self.config.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        log::debug!("📥 Gemini response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.map_err(reqwest::Error::without_url)?;
            log::error!("❌ Gemini API error response: {}", error_text);
            anyhow::bail!("Gemini API error ({}): {}", status, error_text);
        }

        let response_text = response.text().await.map_err(reqwest::Error::without_url)?;
        log::debug!("📄 Raw Gemini response size: {} bytes", response_text.len());

        let parsed: GenerateContentResponse = serde_json::from_str(&response_text)?;

        Ok(Self::extract_text(&parsed))
    }
}
