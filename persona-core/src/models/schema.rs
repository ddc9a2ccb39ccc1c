use chrono::{DateTime, Utc};
use serde_json::Value;

use super::persona::PersonaRecord;

pub const COL_ID: &str = "ID";
pub const COL_NAME: &str = "Name";
pub const COL_DOB: &str = "DOB";
pub const COL_PROFESSION: &str = "Profession";
pub const COL_DESCRIPTION: &str = "Description";
pub const COL_PROMPT: &str = "Prompt";
pub const COL_CREATED_AT: &str = "Created At";

/// Fixed column layout of the row store.
///
/// Rows are written positionally, so the order here must match the header
/// row the store was created with or opened against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSchema {
    pub prompt: bool,
    pub created_at: bool,
}

impl Default for RowSchema {
    fn default() -> Self {
        Self {
            prompt: true,
            created_at: true,
        }
    }
}

impl RowSchema {
    pub fn base() -> Self {
        Self {
            prompt: false,
            created_at: false,
        }
    }

    pub fn header(&self) -> Vec<&'static str> {
        let mut cols = vec![COL_ID, COL_NAME, COL_DOB, COL_PROFESSION, COL_DESCRIPTION];
        if self.prompt {
            cols.push(COL_PROMPT);
        }
        if self.created_at {
            cols.push(COL_CREATED_AT);
        }
        cols
    }

    /// Layout matching an existing header row. The optional columns are
    /// recognised by name; the base columns are assumed to lead.
    pub fn from_header(header: &[String]) -> Self {
        let has = |col: &str| header.iter().any(|h| h.trim() == col);
        Self {
            prompt: has(COL_PROMPT),
            created_at: has(COL_CREATED_AT),
        }
    }

    /// Render a record as cell values in header order.
    pub fn row(&self, record: &PersonaRecord) -> Vec<Value> {
        let mut cells = vec![
            Value::from(record.id),
            Value::from(record.name.as_str()),
            Value::from(record.dob.as_str()),
            Value::from(record.profession.as_str()),
            Value::from(record.description.as_str()),
        ];
        if self.prompt {
            cells.push(Value::from(record.prompt.as_deref().unwrap_or("")));
        }
        if self.created_at {
            let stamp = record
                .created_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            cells.push(Value::from(stamp));
        }
        cells
    }

    /// Map a read-back row onto a record by header name.
    ///
    /// Short rows are padded with empty cells; an unparsable `ID` reads as 0.
    pub fn parse_row(header: &[String], cells: &[Value]) -> PersonaRecord {
        let cell = |col: &str| -> String {
            header
                .iter()
                .position(|h| h.trim() == col)
                .and_then(|i| cells.get(i))
                .map(cell_text)
                .unwrap_or_default()
        };

        let prompt = cell(COL_PROMPT);
        let created_at = DateTime::parse_from_rfc3339(cell(COL_CREATED_AT).trim())
            .ok()
            .map(|t| t.with_timezone(&Utc));

        PersonaRecord {
            id: cell(COL_ID).trim().parse().unwrap_or(0),
            name: cell(COL_NAME),
            dob: cell(COL_DOB),
            profession: cell(COL_PROFESSION),
            description: cell(COL_DESCRIPTION),
            prompt: if prompt.is_empty() { None } else { Some(prompt) },
            created_at,
        }
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
