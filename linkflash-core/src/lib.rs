//! Board-agnostic core logic for the linkflash tool
//!
//! This crate contains everything that does not touch the filesystem,
//! processes or the terminal:
//!
//! - Field definitions for the radio firmware's `user_config.h`
//! - Field codec (locate, decode and rewrite `#define` values in place)
//! - In-memory configuration document
//! - Per-field validation
//! - Editable form values bound by the front end
//! - Flash sequence state machine

#![deny(unsafe_code)]

pub mod document;
pub mod field;
pub mod form;
pub mod state;
pub mod validate;

pub use document::ConfigDocument;
pub use field::{get_field, set_field, CodecError, Field, FieldKind, LinkId, TxRate};
pub use form::Form;
pub use state::{FailureKind, FlashEvent, FlashState, Outcome};
pub use validate::{validate_all, validate_field, validate_form, ValidationError};
