pub mod gemini;
pub mod sync;

pub use gemini::GeminiProvider;
pub use sync::AnalysisSyncClient;
