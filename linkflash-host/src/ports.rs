//! Serial port discovery
//!
//! Lists device nodes matching simple patterns such as `/dev/ttyUSB*`.
//! A pattern is a directory plus a file name with at most one `*`. The
//! directory is listed as-is, so symlink farms like `/dev/serial/by-id`
//! work too.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

/// Pattern without a directory part or with more than one `*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("port pattern needs a directory and at most one '*'")]
pub struct InvalidPattern;

/// Parsed device pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortPattern {
    dir: PathBuf,
    prefix: String,
    /// `None` for an exact name
    suffix: Option<String>,
}

impl PortPattern {
    /// Whether a file name in the pattern's directory matches
    pub fn matches(&self, name: &str) -> bool {
        match &self.suffix {
            None => name == self.prefix,
            Some(suffix) => {
                name.len() >= self.prefix.len() + suffix.len()
                    && name.starts_with(&self.prefix)
                    && name.ends_with(suffix.as_str())
            }
        }
    }

    /// Matching paths, unsorted; an unreadable directory yields nothing
    fn scan(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .flatten()
            .filter(|e| e.file_name().to_str().is_some_and(|n| self.matches(n)))
            .map(|e| e.path().to_string_lossy().into_owned())
            .collect()
    }
}

impl FromStr for PortPattern {
    type Err = InvalidPattern;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dir, name) = s.rsplit_once('/').ok_or(InvalidPattern)?;
        if name.is_empty() || dir.contains('*') {
            return Err(InvalidPattern);
        }
        let dir = if dir.is_empty() { "/" } else { dir };

        let mut parts = name.split('*');
        let prefix = parts.next().unwrap_or_default().to_string();
        let suffix = parts.next().map(str::to_string);
        if parts.next().is_some() {
            return Err(InvalidPattern);
        }
        Ok(Self {
            dir: PathBuf::from(dir),
            prefix,
            suffix,
        })
    }
}

/// Currently present ports, sorted and without duplicates
pub fn discover_ports(patterns: &[PortPattern]) -> Vec<String> {
    let mut ports: Vec<String> = patterns.iter().flat_map(PortPattern::scan).collect();
    ports.sort();
    ports.dedup();
    ports
}
