#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::wad::error::WadResult;
use crate::wad::format::{encode_name, ContentHash, HEADER_LEN};
use crate::wad::io::{to_disk_i32, write_i32};
use crate::wad::manifest::{Manifest, ManifestLine};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssembleStats {
    /// Directory records written.
    pub entries: usize,
    /// Manifest lines dropped as invalid.
    pub skipped: usize,
    /// Bytes not written because identical content was already stored.
    pub deduplicated_bytes: u64,
}

/// Where each distinct content blob landed during one assemble call.
#[derive(Debug, Default)]
struct DedupIndex {
    placed: HashMap<ContentHash, (i32, i32)>,
}

/// Archive layout:
/// - [magic 4]
/// - [i32 entry_count][i32 directory_offset]
/// - entry data, each distinct blob stored once
/// - directory: entry_count x [i32 offset][i32 length][name 8]
///
/// The header counters are written as a placeholder and patched by seeking
/// back once the data region is complete. The directory is collected in a side
/// buffer and appended last. Offsets are relative to the sink position at entry.
pub fn assemble<W: Write + Seek>(
    manifest: &Manifest,
    base_dir: &Path,
    out: &mut W,
) -> WadResult<AssembleStats> {
    let base = out.stream_position()?;
    let mut header = [0u8; HEADER_LEN];
    header[..4].copy_from_slice(&manifest.kind.magic());
    out.write_all(&header)?;

    let mut index = DedupIndex::default();
    let mut directory: Vec<u8> = Vec::new();
    let mut stats = AssembleStats::default();

    for line in &manifest.lines {
        if let Err(e) = line.validate() {
            warn!("skipping invalid line: {e}");
            stats.skipped += 1;
            continue;
        }

        let (offset, length) = place_entry(out, base, base_dir, line, &mut index, &mut stats)?;
        directory.extend_from_slice(&offset.to_le_bytes());
        directory.extend_from_slice(&length.to_le_bytes());
        directory.extend_from_slice(&encode_name(&line.name));
        stats.entries += 1;
    }

    let end = out.stream_position()?;
    let dir_offset = to_disk_i32(end - base, "directory offset")?;
    let count = to_disk_i32(stats.entries as u64, "entry count")?;

    out.seek(SeekFrom::Start(base + 4))?;
    write_i32(out, count)?;
    write_i32(out, dir_offset)?;
    out.seek(SeekFrom::Start(end))?;
    out.write_all(&directory)?;
    out.flush()?;

    info!(
        "assembled {} entries, deduplication saved {} bytes",
        stats.entries, stats.deduplicated_bytes
    );
    Ok(stats)
}

/// Returns the directory `(offset, length)` for one valid line, appending the
/// file's bytes unless identical bytes were already stored in this call.
fn place_entry<W: Write + Seek>(
    out: &mut W,
    base: u64,
    base_dir: &Path,
    line: &ManifestLine,
    index: &mut DedupIndex,
    stats: &mut AssembleStats,
) -> WadResult<(i32, i32)> {
    let Some(filename) = line.filename.as_deref() else {
        debug!("{} is virtual", line.name);
        return Ok((0, 0));
    };

    let data = std::fs::read(base_dir.join(filename))?;
    if data.is_empty() {
        debug!("{} references an empty file, storing as virtual", line.name);
        return Ok((0, 0));
    }

    let hash = ContentHash::of(&data);
    if let Some(&(offset, length)) = index.placed.get(&hash) {
        info!("duplicate {} will be referenced to offset {offset}", line.name);
        stats.deduplicated_bytes += data.len() as u64;
        return Ok((offset, length));
    }

    debug!("adding {} ({} bytes)", line.name, data.len());
    let offset = to_disk_i32(out.stream_position()? - base, "entry offset")?;
    let length = to_disk_i32(data.len() as u64, "entry length")?;
    out.write_all(&data)?;
    index.placed.insert(hash, (offset, length));
    Ok((offset, length))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wad::error::WadError;
    use crate::wad::format::{WadArchive, WadKind};
    use std::io::Cursor;

    fn build(dir: &Path, manifest: &str) -> WadResult<(Vec<u8>, AssembleStats)> {
        let manifest = Manifest::parse(manifest)?;
        let mut cur = Cursor::new(Vec::new());
        let stats = assemble(&manifest, dir, &mut cur)?;
        Ok((cur.into_inner(), stats))
    }

    fn dir_record(bytes: &[u8], i: usize) -> (i32, i32, [u8; 8]) {
        let dir = i32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize + i * 16;
        let offset = i32::from_le_bytes(bytes[dir..dir + 4].try_into().unwrap());
        let length = i32::from_le_bytes(bytes[dir + 4..dir + 8].try_into().unwrap());
        (offset, length, bytes[dir + 8..dir + 16].try_into().unwrap())
    }

    #[test]
    fn identical_files_share_one_location() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), b"same bytes").unwrap();
        std::fs::write(dir.path().join("b"), b"same bytes").unwrap();
        std::fs::write(dir.path().join("c"), b"other").unwrap();

        let (bytes, stats) = build(dir.path(), "IWAD\nA\ta\nB\tb\nC\tc\n").unwrap();
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.deduplicated_bytes, 10);

        let (oa, la, _) = dir_record(&bytes, 0);
        let (ob, lb, name) = dir_record(&bytes, 1);
        assert_eq!((oa, la), (ob, lb));
        assert_eq!((oa, la), (12, 10));
        assert_eq!(&name, b"B\0\0\0\0\0\0\0");

        // data region: "same bytes" + "other", directory right after
        assert_eq!(&bytes[12..27], b"same bytesother");
        assert_eq!(i32::from_le_bytes(bytes[8..12].try_into().unwrap()), 27);
        let occurrences = bytes.windows(10).filter(|w| *w == b"same bytes").count();
        assert_eq!(occurrences, 1);
    }

    #[test]
    fn header_is_patched_and_kind_uppercased() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.lmp"), [7u8; 4]).unwrap();

        let (bytes, _) = build(dir.path(), "pwad\nM_START\nX\tx.lmp\nM_END").unwrap();
        assert_eq!(&bytes[..4], b"PWAD");
        assert_eq!(i32::from_le_bytes(bytes[4..8].try_into().unwrap()), 3);
        assert_eq!(bytes.len(), 12 + 4 + 3 * 16);
        assert_eq!(dir_record(&bytes, 0).0, 0);
        assert_eq!(dir_record(&bytes, 0).1, 0);

        let wad = WadArchive::decode(&bytes).unwrap();
        assert_eq!(wad.kind, WadKind::Pwad);
        assert_eq!(wad.entries[1].data(), &[7u8; 4]);
    }

    #[test]
    fn invalid_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f"), b"data").unwrap();

        let (bytes, stats) = build(dir.path(), "IWAD\n\nF\tf\n\t\nG\t \tx\nH").unwrap();
        assert_eq!(stats.skipped, 3);
        assert_eq!(stats.entries, 2);

        let wad = WadArchive::decode(&bytes).unwrap();
        let names: Vec<_> = wad.entries.iter().map(|e| e.name()).collect();
        assert_eq!(names, ["F", "H"]);
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = build(dir.path(), "IWAD\nA\tnope.lmp").unwrap_err();
        assert!(matches!(err, WadError::Io(_)));
    }
}
