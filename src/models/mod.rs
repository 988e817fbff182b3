use serde::Serialize;

pub const DEFAULT_LANGUAGE: &str = "en";

/// Returned to the caller when the model answers without any usable text.
pub const NO_RESPONSE_SENTINEL: &str = "No valid response generated.";

const ANALYSIS_INSTRUCTION: &str = "You are an expert nutritionist. Analyze the food items in the image and provide:
1. A detailed list of all visible food items
2. Estimated calories for each item
3. Total calorie count
4. Basic nutritional insights

Format the response as:

Food Items and Calories:
1. [Item Name] - [Calories] kcal
2. [Item Name] - [Calories] kcal
...

Total Calories: [Sum] kcal

Nutritional Insights:
• [Key insight about the meal's nutritional value]
• [Suggestions for improvement if needed]";

/// Uploaded image as it arrives from the multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Match a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        };
        write!(f, "{}", s)
    }
}

/// Instruction sent alongside the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    text: String,
}

impl AnalysisPrompt {
    /// Any language other than "en" gets a directive appended, unvalidated.
    pub fn new(language: &str) -> Self {
        let mut text = ANALYSIS_INSTRUCTION.to_string();
        if language != DEFAULT_LANGUAGE {
            text.push_str(&format!(
                "\nPlease provide the response in {} language.",
                language
            ));
        }
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub status: String,
    pub response: String,
}

impl AnalysisResponse {
    pub fn success(response: String) -> Self {
        Self {
            status: "success".to_string(),
            response,
        }
    }
}

/// Body of a 500 from the analysis endpoint.
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub status: String,
    pub error: String,
}

impl FailureResponse {
    pub fn new(error: String) -> Self {
        Self {
            status: "error".to_string(),
            error,
        }
    }
}

/// Body for client errors, 404 and unexpected 500s.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_prompt_has_no_directive() {
        let prompt = AnalysisPrompt::new("en");
        assert!(prompt.as_str().starts_with("You are an expert nutritionist."));
        assert!(!prompt.as_str().contains("Please provide the response in"));
    }

    #[test]
    fn test_french_prompt_has_directive() {
        let prompt = AnalysisPrompt::new("fr");
        assert!(prompt
            .as_str()
            .ends_with("\nPlease provide the response in fr language."));
    }

    #[test]
    fn test_unknown_language_is_passed_through() {
        let prompt = AnalysisPrompt::new("klingon");
        assert!(prompt.as_str().contains("in klingon language."));

        // Only the exact code "en" suppresses the directive.
        let prompt = AnalysisPrompt::new("EN");
        assert!(prompt.as_str().contains("in EN language."));
    }

    #[test]
    fn test_image_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("Jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("bmp"), None);
        assert_eq!(ImageFormat::Png.mime_type(), "image/png");
        assert_eq!(ImageFormat::Jpeg.mime_type(), "image/jpeg");
    }
}
