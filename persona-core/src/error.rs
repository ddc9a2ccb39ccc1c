use thiserror::Error;

use crate::generator::GenerationError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum PersonaError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}
