use serde::Serialize;

use crate::models::{PersonaDraft, PersonaRecord};

/// Non-fatal problem with one slot of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchWarning {
    Skipped { position: u32 },
    GenerationFailed { position: u32, reason: String },
    AppendFailed { position: u32, reason: String },
}

impl BatchWarning {
    pub fn position(&self) -> u32 {
        match self {
            BatchWarning::Skipped { position }
            | BatchWarning::GenerationFailed { position, .. }
            | BatchWarning::AppendFailed { position, .. } => *position,
        }
    }

    pub fn message(&self) -> String {
        match self {
            BatchWarning::Skipped { position } => {
                format!("Skipping Character {position}: Name and Profession required.")
            }
            BatchWarning::GenerationFailed { position, reason } => {
                format!("Text generation failed for Character {position}: {reason}")
            }
            BatchWarning::AppendFailed { position, reason } => {
                format!("Error saving Character {position}: {reason}")
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct Validated {
    pub records: Vec<PersonaRecord>,
    pub warnings: Vec<BatchWarning>,
}

/// Keep drafts with a name and a profession; warn about the rest.
pub fn validate(drafts: Vec<PersonaDraft>) -> Validated {
    let mut out = Validated::default();
    for draft in drafts {
        if draft.is_complete() {
            out.records.push(draft.into_record());
        } else {
            let warning = BatchWarning::Skipped {
                position: draft.position(),
            };
            tracing::warn!(position = draft.position(), "{}", warning.message());
            out.warnings.push(warning);
        }
    }
    out
}
