//! Editable form values
//!
//! The front end binds its inputs to a [`Form`]. Values stay as typed
//! display strings until a flash attempt validates them and merges them
//! into the [`ConfigDocument`].

use crate::document::ConfigDocument;
use crate::field::{CodecError, Constraint, Field};
use crate::validate::{self, ValidationError};

/// Display values for every field, indexed by [`Field`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    values: [String; 5],
}

impl Form {
    /// Populate from the current document
    pub fn from_document(doc: &ConfigDocument) -> Self {
        Self {
            values: Field::ALL.map(|f| doc.get(f)),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field as usize]
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values[field as usize] = value.into();
    }

    /// Mutable text of a free-form field
    pub fn text_mut(&mut self, field: Field) -> &mut String {
        &mut self.values[field as usize]
    }

    /// Step a fixed-choice field to the next (or previous) option
    ///
    /// A value that is not one of the options moves to the first option.
    /// Free-form fields are left alone.
    pub fn cycle(&mut self, field: Field, forward: bool) {
        let Some(options) = field.options() else {
            return;
        };
        let next = match options.iter().position(|o| *o == self.get(field)) {
            Some(i) if forward => (i + 1) % options.len(),
            Some(i) => (i + options.len() - 1) % options.len(),
            None => 0,
        };
        self.set(field, options[next]);
    }

    /// First failing field, if any
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::validate_form(self)
    }

    /// Every failing field
    pub fn validate_all(&self) -> Vec<ValidationError> {
        validate::validate_all(self)
    }

    /// Merge the form into a document
    ///
    /// Values are trimmed, numbers rewritten in plain decimal and the link
    /// identifier upper-cased. All fields are applied or none: on error `doc`
    /// is unchanged.
    pub fn apply_to(&self, doc: &mut ConfigDocument) -> Result<(), CodecError> {
        let mut merged = doc.clone();
        for field in Field::ALL {
            let value = self.get(field);
            let value = match (field, field.def().constraint) {
                // C reads a leading zero as octal
                (_, Constraint::Range { .. }) => match value.trim().parse::<u32>() {
                    Ok(n) => n.to_string(),
                    Err(_) => value.trim().to_string(),
                },
                (Field::LinkId, _) => value.trim().to_uppercase(),
                // TX labels carry internal padding; the codec trims the ends itself
                (Field::TxRate, _) => value.to_string(),
                _ => value.trim().to_string(),
            };
            merged.set(field, &value)?;
        }
        *doc = merged;
        Ok(())
    }
}
