//! In-memory configuration document
//!
//! Holds the full text of `user_config.h` for the session. Field edits
//! rewrite value tokens in place; every other byte is carried through
//! unchanged to the next save.

use crate::field::{get_field, locate, set_field, CodecError, Field};

/// Full header text owned by the application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    text: String,
}

impl ConfigDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Display value of a field (default display value if absent)
    pub fn get(&self, field: Field) -> String {
        get_field(&self.text, field)
    }

    /// Rewrite a field's value in place
    ///
    /// The document is unchanged on error.
    pub fn set(&mut self, field: Field, value: &str) -> Result<(), CodecError> {
        self.text = set_field(&self.text, field, value)?;
        Ok(())
    }

    /// Fields that cannot be written back (missing, duplicated or unclosed)
    pub fn unwritable_fields(&self) -> Vec<CodecError> {
        Field::ALL
            .into_iter()
            .filter_map(|f| locate(&self.text, f).err())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut doc = ConfigDocument::new("#define MAX_PACKET_SIZE 64 /* bytes */\n");
        doc.set(Field::PacketSize, "128").unwrap();
        assert_eq!(doc.get(Field::PacketSize), "128");
        assert_eq!(doc.as_str(), "#define MAX_PACKET_SIZE 128 /* bytes */\n");
    }

    #[test]
    fn test_failed_set_leaves_document() {
        let mut doc = ConfigDocument::new("#define MAX_PACKET_SIZE 64\n");
        let before = doc.clone();
        assert!(doc.set(Field::Channel, "6").is_err());
        assert!(doc.set(Field::PacketSize, "").is_err());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_unwritable_fields() {
        let doc = ConfigDocument::new(
            "#define WIFI_DEFAULT_CHANNEL 6\n#define WIFI_DEFAULT_CHANNEL 7\n#define MAX_PACKET_SIZE 64\n",
        );
        let errors = doc.unwritable_fields();
        assert!(errors.contains(&CodecError::Duplicate(Field::Channel)));
        assert!(errors.contains(&CodecError::Missing(Field::LinkId)));
        assert!(!errors.iter().any(|e| e.field() == Field::PacketSize));
        assert_eq!(errors.len(), 4);
    }
}
