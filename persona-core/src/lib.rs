pub mod batch;
pub mod config;
pub mod context;
pub mod error;
pub mod form;
pub mod generator;
pub mod models;
pub mod store;
pub mod validate;

pub use batch::{submit_batch, BatchReport};
pub use config::PersonaConfig;
pub use context::{load_context, FewShotContext};
pub use error::PersonaError;
pub use form::{Field, FormError, FormState, MAX_PERSONAS};
pub use generator::{
    enrich, Enrichment, GeminiTextClient, GeminiTextConfig, GenerationError, GenerationOutcome,
    TextGenerator, FALLBACK_DESCRIPTION,
};
pub use models::{PersonaDraft, PersonaRecord, RowSchema};
pub use store::{MemoryRowStore, RowStore, SheetsConfig, SheetsRowStore, StoreError, StoreInfo};
pub use validate::{validate, BatchWarning, Validated};
