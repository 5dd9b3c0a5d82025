#![forbid(unsafe_code)]

use std::io::{Cursor, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, info};

use crate::wad::error::{WadError, WadResult};
use crate::wad::format::{
    decode_name, Entry, WadArchive, WadKind, DIR_ENTRY_LEN, HEADER_LEN, NAME_LEN,
};
use crate::wad::io::{read_exact, read_i32};

impl WadArchive {
    /// Parses an archive held in memory. The input is never modified and every
    /// entry receives its own copy of the bytes.
    pub fn decode(bytes: &[u8]) -> WadResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(WadError::Format(format!(
                "{} bytes is shorter than the {HEADER_LEN}-byte header",
                bytes.len()
            )));
        }
        let mut cur = Cursor::new(bytes);

        let magic = read_exact::<4>(&mut cur)?;
        let kind = WadKind::from_magic(&magic)
            .ok_or_else(|| WadError::Format("unrecognized header".into()))?;

        let count = read_i32(&mut cur)?;
        let dir_offset = read_i32(&mut cur)?;
        debug!("number of entries: {count}, directory start: {dir_offset}");

        let count = usize::try_from(count)
            .map_err(|_| WadError::Format(format!("negative entry count {count}")))?;
        let dir_offset = u64::try_from(dir_offset)
            .map_err(|_| WadError::Format(format!("negative directory offset {dir_offset}")))?;

        let dir_end = dir_offset as usize + count.saturating_mul(DIR_ENTRY_LEN);
        if dir_end > bytes.len() {
            return Err(WadError::Format("directory extends beyond end of file".into()));
        }

        cur.seek(SeekFrom::Start(dir_offset))?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let pos = read_i32(&mut cur)?;
            let len = read_i32(&mut cur)?;
            let name = decode_name(&read_exact::<NAME_LEN>(&mut cur)?);

            if pos > 0 && len > 0 {
                let start = pos as usize;
                let end = start + len as usize;
                if end > bytes.len() {
                    return Err(WadError::Format(format!("{name}: data outside file")));
                }
                debug!("{name} is {len} bytes");
                entries.push(Entry::new(name, pos as u32, bytes[start..end].to_vec()));
            } else {
                debug!("{name} is virtual");
                entries.push(Entry::marker(name));
            }
        }

        let archive = WadArchive { kind, entries };
        info!(
            "wad has {} entries ({} virtual)",
            archive.entries.len(),
            archive.virtual_count()
        );
        Ok(archive)
    }

    /// Loads a whole archive file into memory and decodes it.
    pub fn open(path: &Path) -> WadResult<Self> {
        debug!("loading {} into memory", path.display());
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }
}
