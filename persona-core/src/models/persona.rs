use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A validated persona, ready to be appended to the row store.
///
/// `id` is the 1-based position within the submission batch, not a
/// store-wide identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaRecord {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub dob: String,
    pub profession: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Raw field values of one form slot, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaDraft {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub profession: String,
    #[serde(default)]
    pub description: String,
}

impl PersonaDraft {
    /// 1-based position shown to the user.
    pub fn position(&self) -> u32 {
        self.index as u32 + 1
    }

    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.profession.trim().is_empty()
    }

    pub fn into_record(self) -> PersonaRecord {
        PersonaRecord {
            id: self.position(),
            name: self.name,
            dob: self.dob,
            profession: self.profession,
            description: self.description,
            prompt: None,
            created_at: None,
        }
    }
}
