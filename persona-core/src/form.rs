//! Request-scoped form state for a batch of persona slots.
//!
//! Values are keyed by `(Field, index)`. The slot count only changes through
//! [`FormState::resize`], which prunes indices at or above the new count and
//! creates empty entries for any missing index below it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::PersonaDraft;

/// Upper bound on slots in a single batch.
pub const MAX_PERSONAS: usize = 100;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("Persona count {count} is out of range (1..={max})")]
    CountOutOfRange { count: usize, max: usize },

    #[error("Slot index {index} is out of range for {count} personas")]
    IndexOutOfRange { index: usize, count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Dob,
    Profession,
    Description,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Dob, Field::Profession, Field::Description];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Dob => "Date of Birth",
            Field::Profession => "Profession",
            Field::Description => "Description",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    count: usize,
    values: BTreeMap<(usize, Field), String>,
}

impl FormState {
    pub fn new(count: usize) -> Result<Self, FormError> {
        let mut state = Self {
            count: 0,
            values: BTreeMap::new(),
        };
        state.resize(count)?;
        Ok(state)
    }

    /// Build a state from submitted drafts, then apply `count`.
    ///
    /// Drafts are placed by position in the list; their `index` field is
    /// ignored. Drafts beyond `count` are pruned.
    pub fn from_drafts(count: usize, drafts: Vec<PersonaDraft>) -> Result<Self, FormError> {
        check_count(count)?;
        let mut values = BTreeMap::new();
        for (index, draft) in drafts.into_iter().enumerate() {
            values.insert((index, Field::Name), draft.name);
            values.insert((index, Field::Dob), draft.dob);
            values.insert((index, Field::Profession), draft.profession);
            values.insert((index, Field::Description), draft.description);
        }
        let mut state = Self { count: 0, values };
        state.resize(count)?;
        Ok(state)
    }

    pub fn resize(&mut self, count: usize) -> Result<(), FormError> {
        check_count(count)?;
        self.values.retain(|(index, _), _| *index < count);
        for index in 0..count {
            for field in Field::ALL {
                self.values.entry((index, field)).or_default();
            }
        }
        self.count = count;
        Ok(())
    }

    pub fn set(&mut self, field: Field, index: usize, value: impl Into<String>) -> Result<(), FormError> {
        if index >= self.count {
            return Err(FormError::IndexOutOfRange {
                index,
                count: self.count,
            });
        }
        self.values.insert((index, field), value.into());
        Ok(())
    }

    pub fn get(&self, field: Field, index: usize) -> &str {
        self.values
            .get(&(index, field))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of distinct slot indices holding entries.
    pub fn slots(&self) -> usize {
        let mut indices: Vec<usize> = self.values.keys().map(|(i, _)| *i).collect();
        indices.dedup();
        indices.len()
    }

    pub fn drafts(&self) -> Vec<PersonaDraft> {
        (0..self.count)
            .map(|index| PersonaDraft {
                index,
                name: self.get(Field::Name, index).to_string(),
                dob: self.get(Field::Dob, index).to_string(),
                profession: self.get(Field::Profession, index).to_string(),
                description: self.get(Field::Description, index).to_string(),
            })
            .collect()
    }
}

fn check_count(count: usize) -> Result<(), FormError> {
    if count == 0 || count > MAX_PERSONAS {
        return Err(FormError::CountOutOfRange {
            count,
            max: MAX_PERSONAS,
        });
    }
    Ok(())
}
