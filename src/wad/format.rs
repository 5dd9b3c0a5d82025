#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use crate::wad::error::WadError;
use crate::wad::io::hex32;

/// Header magic of a master archive.
pub const IWAD_MAGIC: [u8; 4] = *b"IWAD";

/// Header magic of a patch archive.
pub const PWAD_MAGIC: [u8; 4] = *b"PWAD";

/// `magic + entry count + directory offset`.
pub const HEADER_LEN: usize = 12;

/// `offset + length + name`.
pub const DIR_ENTRY_LEN: usize = 16;

/// Lump names are stored NUL-padded in a fixed field of this size.
pub const NAME_LEN: usize = 8;

/// Archive role. Exactly one per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WadKind {
    Iwad,
    Pwad,
}

impl WadKind {
    pub fn magic(self) -> [u8; 4] {
        match self {
            WadKind::Iwad => IWAD_MAGIC,
            WadKind::Pwad => PWAD_MAGIC,
        }
    }

    pub fn from_magic(magic: &[u8; 4]) -> Option<Self> {
        match magic {
            m if *m == IWAD_MAGIC => Some(WadKind::Iwad),
            m if *m == PWAD_MAGIC => Some(WadKind::Pwad),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WadKind::Iwad => "IWAD",
            WadKind::Pwad => "PWAD",
        }
    }
}

impl fmt::Display for WadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive, surrounding whitespace ignored.
impl FromStr for WadKind {
    type Err = WadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IWAD" => Ok(WadKind::Iwad),
            "PWAD" => Ok(WadKind::Pwad),
            other => Err(WadError::Format(format!("unrecognized header {other:?}"))),
        }
    }
}

/// Blake3 digest of an entry's bytes. Used as an opaque identity key for dedup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(data);
        ContentHash(hasher.finalize().into())
    }

    pub fn hex(&self) -> String {
        hex32(&self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

/// One directory record plus its owned bytes.
///
/// A virtual entry has no data, a zero offset and a zero length. Every entry
/// with data has a non-empty buffer.
#[derive(Debug, Clone)]
pub struct Entry {
    name: String,
    offset: u32,
    data: Option<Vec<u8>>,
    hash: ContentHash,
}

impl Entry {
    /// Builds a content entry. An empty buffer yields a virtual entry.
    pub fn new(name: impl Into<String>, offset: u32, data: Vec<u8>) -> Self {
        if data.is_empty() {
            return Self::marker(name);
        }
        let hash = ContentHash::of(&data);
        Self {
            name: name.into(),
            offset,
            data: Some(data),
            hash,
        }
    }

    /// Builds a virtual entry (structural marker such as `S_START`).
    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            offset: 0,
            data: None,
            hash: ContentHash::of(&[]),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    pub fn is_virtual(&self) -> bool {
        self.data.is_none()
    }

    /// Entry bytes; empty for virtual entries.
    pub fn data(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }

    pub fn hash(&self) -> ContentHash {
        self.hash
    }
}

/// Decoded archive. Entry order is the on-disk directory order.
#[derive(Debug, Clone)]
pub struct WadArchive {
    pub kind: WadKind,
    pub entries: Vec<Entry>,
}

impl WadArchive {
    pub fn virtual_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_virtual()).count()
    }
}

/// Decodes a NUL-padded name field. Stops at the first NUL; bytes outside
/// ASCII become `?`.
pub fn decode_name(raw: &[u8; NAME_LEN]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    raw[..end]
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}

/// Encodes a name into its fixed on-disk field, truncating past 8 bytes.
pub fn encode_name(name: &str) -> [u8; NAME_LEN] {
    let mut out = [0u8; NAME_LEN];
    for (slot, c) in out.iter_mut().zip(name.chars()) {
        *slot = if c.is_ascii() { c as u8 } else { b'?' };
    }
    out
}
