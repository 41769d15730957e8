use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::ModelConfig;

mod gemini;

pub use gemini::GeminiModel;

/// Generative model boundary: one text prompt in, one text response out.
///
/// The provider guarantees nothing about the response shape; robustness
/// against malformed output is entirely the pipeline's responsibility.
#[async_trait]
pub trait SopModel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Build the configured model provider.
pub fn build_model(config: &ModelConfig) -> Result<Arc<dyn SopModel>> {
    let provider = config.provider.as_deref().unwrap_or("gemini");

    let model: Arc<dyn SopModel> = match provider {
        "gemini" => {
            let api_key = config
                .api_key
                .clone()
                .context("api_key is required for the Gemini provider")?;
            let model_name = config
                .model
                .clone()
                .unwrap_or_else(|| "gemini-2.5-flash".to_string());

            Arc::new(GeminiModel::new(
                api_key,
                model_name,
                config.api_endpoint.clone(),
            ))
        }
        _ => bail!(
            "Unknown model provider '{}'. Supported providers: gemini",
            provider
        ),
    };

    info!("Using {} for SOP generation", model.name());

    Ok(model)
}
