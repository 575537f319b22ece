//! Field validation
//!
//! Checks form values against each field's [`Constraint`] before they are
//! written to the header. Fixed-choice fields (TX rate, baud rate) are
//! enforced by the front end offering only those options and are not
//! checked here.

use core::fmt;

use crate::field::{Constraint, Field, LinkId, LinkIdError};
use crate::form::Form;

/// A value that failed its field's constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Not a decimal integer
    NotANumber(Field),
    /// Integer outside the inclusive range
    OutOfRange { field: Field, min: u32, max: u32 },
    /// Not six colon-separated two-character groups
    LinkIdFormat(Field),
    /// A group is not valid hex
    LinkIdHex(Field),
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match *self {
            ValidationError::NotANumber(f)
            | ValidationError::LinkIdFormat(f)
            | ValidationError::LinkIdHex(f) => f,
            ValidationError::OutOfRange { field, .. } => field,
        }
    }
}

/// Name used in error messages
fn subject(field: Field) -> &'static str {
    match field {
        Field::Channel => "Channel",
        Field::LinkId => "BSSID",
        Field::TxRate => "TX rate",
        Field::BaudRate => "Baud rate",
        Field::PacketSize => "Packet size",
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ValidationError::NotANumber(field) => write!(f, "{} must be a number", subject(field)),
            ValidationError::OutOfRange { field, min, max } => {
                write!(f, "{} must be {}-{}", subject(field), min, max)
            }
            ValidationError::LinkIdFormat(field) => {
                write!(f, "{} format: AA:BB:CC:DD:EE:FF", subject(field))
            }
            ValidationError::LinkIdHex(field) => write!(f, "{} has invalid hex", subject(field)),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a single display value against its field's constraint
pub fn validate_field(field: Field, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    match field.def().constraint {
        Constraint::Range { min, max } => {
            let n: i64 = value.parse().map_err(|_| ValidationError::NotANumber(field))?;
            if n < i64::from(min) || n > i64::from(max) {
                return Err(ValidationError::OutOfRange { field, min, max });
            }
            Ok(())
        }
        Constraint::LinkId => match value.parse::<LinkId>() {
            Ok(_) => Ok(()),
            Err(LinkIdError::Format) => Err(ValidationError::LinkIdFormat(field)),
            Err(LinkIdError::InvalidHex) => Err(ValidationError::LinkIdHex(field)),
        },
        Constraint::OneOf(_) => Ok(()),
    }
}

/// Validate a form, stopping at the first failing field
pub fn validate_form(form: &Form) -> Result<(), ValidationError> {
    Field::ALL
        .into_iter()
        .try_for_each(|field| validate_field(field, form.get(field)))
}

/// Validate every field of a form, collecting all failures
pub fn validate_all(form: &Form) -> Vec<ValidationError> {
    Field::ALL
        .into_iter()
        .filter_map(|field| validate_field(field, form.get(field)).err())
        .collect()
}
