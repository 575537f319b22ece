//! Configurable fields of the radio firmware header
//!
//! Each field is a C object-like macro (`#define NAME value`) inside
//! `user_config.h`. The codec reads and rewrites the value token(s) of a
//! field while leaving every other byte of the header untouched.

pub mod codec;
pub mod types;

pub use codec::{encode, get_field, locate, set_field, CodecError, Definition};
pub use types::*;
