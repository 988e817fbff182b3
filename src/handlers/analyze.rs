use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::models::{
    AnalysisPrompt, ErrorResponse, FailureResponse, ImageFormat, ImageUpload,
    NO_RESPONSE_SENTINEL,
};
use crate::services::AIService;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No image provided in request")]
    MissingImage,
    #[error("No selected file")]
    EmptyFileName,
    #[error("Invalid file type. Only PNG, JPG, and JPEG are allowed")]
    InvalidFileType,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Form(#[from] MultipartError),
    #[error(transparent)]
    NotMultipart(#[from] MultipartRejection),
    #[error("{0}")]
    Model(anyhow::Error),
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        match self {
            AnalyzeError::Validation(e) => {
                log::warn!("⚠️ Rejected upload: {}", e);
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))).into_response()
            }
            AnalyzeError::Form(e) => {
                log::warn!("⚠️ Malformed multipart body: {}", e);
                (e.status(), Json(ErrorResponse::new(e.body_text()))).into_response()
            }
            AnalyzeError::NotMultipart(e) => {
                log::warn!("⚠️ Request is not a multipart form: {}", e);
                (e.status(), Json(ErrorResponse::new(e.body_text()))).into_response()
            }
            AnalyzeError::Model(e) => {
                log::error!("❌ Error processing request: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(FailureResponse::new(e.to_string())),
                )
                    .into_response()
            }
        }
    }
}

/// Check the uploaded file and work out its format from the extension.
pub fn validate_image(upload: Option<&ImageUpload>) -> Result<ImageFormat, ValidationError> {
    let upload = upload.ok_or(ValidationError::MissingImage)?;

    // A part without a filename is a plain form field, not a file.
    let file_name = upload
        .file_name
        .as_deref()
        .ok_or(ValidationError::MissingImage)?;

    if file_name.is_empty() {
        return Err(ValidationError::EmptyFileName);
    }

    let (_, ext) = file_name
        .rsplit_once('.')
        .ok_or(ValidationError::InvalidFileType)?;

    ImageFormat::from_extension(ext).ok_or(ValidationError::InvalidFileType)
}

pub struct AnalysisHandler {
    ai: Arc<dyn AIService>,
}

impl AnalysisHandler {
    pub fn new(ai: Arc<dyn AIService>) -> Self {
        Self { ai }
    }

    /// Validate, build the prompt and make exactly one model call.
    pub async fn analyze(
        &self,
        upload: Option<ImageUpload>,
        language: &str,
    ) -> Result<String, AnalyzeError> {
        let format = validate_image(upload.as_ref())?;
        let image = upload.map(|u| u.data).unwrap_or_default();

        log::info!(
            "📸 Analyzing {} image ({} bytes, language: {})",
            format,
            image.len(),
            language
        );

        let prompt = AnalysisPrompt::new(language);

        match self
            .ai
            .analyze_food_image(prompt.as_str(), &image, format)
            .await
        {
            Ok(Some(text)) => {
                log::info!("✅ Analysis complete ({} chars)", text.len());
                Ok(text)
            }
            Ok(None) => {
                log::warn!("⚠️ No valid response generated from Gemini API");
                Ok(NO_RESPONSE_SENTINEL.to_string())
            }
            Err(e) => Err(AnalyzeError::Model(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai_service::mock::{MockAIService, MockReply};

    fn upload(name: Option<&str>) -> ImageUpload {
        ImageUpload {
            file_name: name.map(str::to_string),
            data: vec![0xFF, 0xD8, 0xFF],
        }
    }

    #[test]
    fn test_validate_accepts_allowed_extensions() {
        for name in ["meal.png", "meal.PNG", "meal.Jpg", "meal.jpeg", "my.lunch.JPEG"] {
            assert!(validate_image(Some(&upload(Some(name)))).is_ok(), "{}", name);
        }
        assert_eq!(
            validate_image(Some(&upload(Some("a.png")))),
            Ok(ImageFormat::Png)
        );
        assert_eq!(
            validate_image(Some(&upload(Some("a.JPG")))),
            Ok(ImageFormat::Jpeg)
        );
    }

    #[test]
    fn test_validate_rejects() {
        assert_eq!(validate_image(None), Err(ValidationError::MissingImage));
        assert_eq!(
            validate_image(Some(&upload(None))),
            Err(ValidationError::MissingImage)
        );
        assert_eq!(
            validate_image(Some(&upload(Some("")))),
            Err(ValidationError::EmptyFileName)
        );
        for name in ["meal.bmp", "meal.gif", "meal", "png", "meal.png.exe", "meal."] {
            assert_eq!(
                validate_image(Some(&upload(Some(name)))),
                Err(ValidationError::InvalidFileType),
                "{}",
                name
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_upload_makes_no_model_call() {
        let mock = Arc::new(MockAIService::new(MockReply::Text("unused".to_string())));
        let handler = AnalysisHandler::new(mock.clone());

        let result = handler.analyze(Some(upload(Some("meal.bmp"))), "en").await;

        assert!(matches!(
            result,
            Err(AnalyzeError::Validation(ValidationError::InvalidFileType))
        ));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_passes_prompt_and_bytes_through() {
        let mock = Arc::new(MockAIService::new(MockReply::Text(
            "Total Calories: 500 kcal".to_string(),
        )));
        let handler = AnalysisHandler::new(mock.clone());

        let text = handler
            .analyze(Some(upload(Some("meal.jpeg"))), "fr")
            .await
            .unwrap();

        assert_eq!(text, "Total Calories: 500 kcal");

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].image, vec![0xFF, 0xD8, 0xFF]);
        assert_eq!(calls[0].format, ImageFormat::Jpeg);
        assert!(calls[0]
            .prompt
            .ends_with("Please provide the response in fr language."));
    }

    #[tokio::test]
    async fn test_empty_model_reply_becomes_sentinel() {
        let handler = AnalysisHandler::new(Arc::new(MockAIService::new(MockReply::Empty)));

        let text = handler
            .analyze(Some(upload(Some("meal.png"))), "en")
            .await
            .unwrap();

        assert_eq!(text, NO_RESPONSE_SENTINEL);
    }

    #[tokio::test]
    async fn test_model_failure_is_propagated() {
        let handler = AnalysisHandler::new(Arc::new(MockAIService::new(MockReply::Fail(
            "quota exceeded".to_string(),
        ))));

        let err = handler
            .analyze(Some(upload(Some("meal.png"))), "en")
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyzeError::Model(_)));
        assert_eq!(err.to_string(), "quota exceeded");
    }
}
