//! Sales ML - сегментация товаров и модель прибыли

pub mod api;
pub mod config;
pub mod error;
pub mod linalg;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod types;

pub use types::*;
pub use models::*;
pub use preprocessing::*;

// Re-export для удобства
pub use config::AnalysisConfig;
pub use error::{MlError, Result};
pub use pipeline::AnalysisPipeline;
