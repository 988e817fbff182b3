pub mod ai_service;
pub mod gemini; // Google Gemini generateContent client

pub use ai_service::AIService;
pub use gemini::GeminiService;
