//! Batch submission: validate, optionally enrich, then append in order.
//!
//! Every per-record failure is recorded as a [`BatchWarning`] and the batch
//! moves on. Nothing is retried, and rows appended before a failure stay.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::generator::{enrich, TextGenerator};
use crate::models::{PersonaDraft, PersonaRecord};
use crate::store::RowStore;
use crate::validate::{validate, BatchWarning};

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    /// Number of form slots submitted, valid or not.
    pub submitted: usize,
    pub saved: Vec<PersonaRecord>,
    pub warnings: Vec<BatchWarning>,
}

impl BatchReport {
    pub fn all_saved(&self) -> bool {
        !self.saved.is_empty()
            && !self
                .warnings
                .iter()
                .any(|w| matches!(w, BatchWarning::AppendFailed { .. }))
    }

    pub fn message(&self) -> &'static str {
        if self.all_saved() {
            "All personas saved!"
        } else if self.saved.is_empty() {
            "No personas saved."
        } else {
            "Some personas could not be saved."
        }
    }
}

pub async fn submit_batch(
    drafts: Vec<PersonaDraft>,
    store: &dyn RowStore,
    generator: Option<&dyn TextGenerator>,
    context: &str,
) -> BatchReport {
    let batch_id = Uuid::new_v4();
    let submitted = drafts.len();
    let validated = validate(drafts);
    let mut warnings = validated.warnings;
    let mut saved = Vec::with_capacity(validated.records.len());

    tracing::info!(
        %batch_id,
        submitted,
        valid = validated.records.len(),
        generate = generator.is_some(),
        "Processing persona batch"
    );

    for mut record in validated.records {
        if let Some(generator) = generator {
            let enrichment = enrich(generator, &record, context).await;
            if let Some(reason) = enrichment.failure() {
                warnings.push(BatchWarning::GenerationFailed {
                    position: record.id,
                    reason: reason.to_string(),
                });
            }
            record.prompt = enrichment.narrative.text().map(str::to_string);
            record.description = enrichment.description.description_or_fallback();
        }

        record.created_at = Some(Utc::now());

        match store.append(&record).await {
            Ok(()) => {
                tracing::info!(%batch_id, id = record.id, name = %record.name, "Persona saved");
                saved.push(record);
            }
            Err(e) => {
                tracing::warn!(%batch_id, id = record.id, error = %e, "Failed to save persona");
                warnings.push(BatchWarning::AppendFailed {
                    position: record.id,
                    reason: e.to_string(),
                });
            }
        }
    }

    warnings.sort_by_key(BatchWarning::position);

    BatchReport {
        batch_id,
        submitted,
        saved,
        warnings,
    }
}
