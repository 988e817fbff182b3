use anyhow::Result;

use crate::models::ImageFormat;

/// Trait for multimodal AI services (Gemini, test doubles).
///
/// `Ok(None)` means the model answered but produced no extractable text.
#[async_trait::async_trait]
pub trait AIService: Send + Sync {
    async fn analyze_food_image(
        &self,
        prompt: &str,
        image: &[u8],
        format: ImageFormat,
    ) -> Result<Option<String>>;
}
