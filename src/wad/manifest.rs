#![forbid(unsafe_code)]

//! `!INDEX.TXT` codec.
//!
//! Layout:
//! - line 1: `IWAD` or `PWAD`
//! - one line per directory entry, in directory order:
//!   - virtual: `NAME`
//!   - content: `NAME<TAB>FILENAME<TAB>HASH`
//!
//! Padding around fields is cosmetic. The hash column is informational and is
//! never compared against the file contents.

use std::path::Path;

use crate::wad::error::{WadError, WadResult};
use crate::wad::format::{ContentHash, WadKind};

/// Name of the manifest file inside an export directory.
pub const INDEX_FILE: &str = "!INDEX.TXT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLine {
    /// 1-based line number in the manifest text.
    pub line_no: usize,
    pub name: String,
    /// `None` for virtual entries.
    pub filename: Option<String>,
    pub hash: Option<String>,
}

impl ManifestLine {
    pub fn parse(line_no: usize, text: &str) -> Self {
        let text = text.trim_end();
        let mut fields = text.split('\t');
        let first = fields.next().unwrap_or_default();

        match fields.next() {
            Some(filename) => ManifestLine {
                line_no,
                name: first.trim().to_string(),
                filename: Some(filename.trim().to_string()),
                hash: fields
                    .next()
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(str::to_string),
            },
            None => ManifestLine {
                line_no,
                name: text.trim().to_string(),
                filename: None,
                hash: None,
            },
        }
    }

    pub fn is_virtual(&self) -> bool {
        self.filename.is_none()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// A line needs a name, and a file name unless it is virtual.
    pub fn validate(&self) -> WadResult<()> {
        let reason = if self.name.is_empty() {
            "missing entry name"
        } else if self.filename.as_deref() == Some("") {
            "missing file name"
        } else {
            return Ok(());
        };
        Err(WadError::Manifest {
            line: self.line_no,
            reason: reason.into(),
        })
    }
}

/// A parsed manifest. `lines` keeps invalid rows so the assembler can report
/// and skip them individually.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub kind: WadKind,
    pub lines: Vec<ManifestLine>,
}

impl Manifest {
    /// A leading byte-order mark left by text editors is ignored.
    pub fn parse(text: &str) -> WadResult<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut rows = text.lines();
        let kind = rows
            .next()
            .ok_or_else(|| WadError::Format("manifest is empty".into()))?
            .parse::<WadKind>()?;

        let lines = rows
            .enumerate()
            .map(|(i, row)| ManifestLine::parse(i + 2, row))
            .collect();

        Ok(Manifest { kind, lines })
    }

    pub fn load(dir: &Path) -> WadResult<Self> {
        let text = std::fs::read_to_string(dir.join(INDEX_FILE))?;
        Self::parse(&text)
    }
}

pub fn virtual_line(name: &str) -> String {
    format!("{name:>8}")
}

pub fn content_line(name: &str, filename: &str, hash: &ContentHash) -> String {
    format!("{name:>8}\t{filename:>12}\t{hash}")
}
