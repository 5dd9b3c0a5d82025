#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::media::{classify, convert_as, Converted, MediaKind};
use crate::wad::error::WadResult;
use crate::wad::format::{ContentHash, WadArchive};
use crate::wad::manifest::{content_line, virtual_line, INDEX_FILE};
use crate::wad::path::{sanitize_file_name, NameRegistry};

/// Subdirectory of an export that receives converted copies.
pub const MEDIA_DIR: &str = "MEDIA";

/// Destination of exported entry bytes and their converted copies.
pub trait ExportSink {
    fn write_file(&mut self, filename: &str, data: &[u8]) -> WadResult<()>;

    fn write_media(&mut self, filename: &str, converted: &Converted) -> WadResult<()>;
}

/// Writes entries into a directory and converted media into `MEDIA/` below it.
#[derive(Debug)]
pub struct DirSink {
    root: PathBuf,
    media: PathBuf,
}

impl DirSink {
    pub fn create(root: &Path) -> WadResult<Self> {
        let media = root.join(MEDIA_DIR);
        std::fs::create_dir_all(&media)?;
        Ok(Self {
            root: root.to_path_buf(),
            media,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ExportSink for DirSink {
    fn write_file(&mut self, filename: &str, data: &[u8]) -> WadResult<()> {
        std::fs::write(self.root.join(filename), data)?;
        Ok(())
    }

    fn write_media(&mut self, filename: &str, converted: &Converted) -> WadResult<()> {
        let name = format!("{filename}.{}", converted.extension);
        std::fs::write(self.media.join(name), &converted.bytes)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Also write converted copies of recognized media.
    pub convert_media: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            convert_media: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub files_written: usize,
    /// Entries whose bytes were already written under another name.
    pub references: usize,
    pub virtual_entries: usize,
    /// Entries with an empty name. Their manifest lines are skipped on assemble.
    pub unnamed: usize,
    pub converted: usize,
    pub conversion_failures: usize,
}

/// Writes each distinct entry payload once and returns the manifest text that
/// reassembles the archive in the same order.
pub fn export(
    archive: &WadArchive,
    sink: &mut dyn ExportSink,
    opts: &ExportOptions,
) -> WadResult<(String, ExportStats)> {
    let mut names = NameRegistry::with_reserved(&[MEDIA_DIR, INDEX_FILE]);
    let mut exported: HashMap<ContentHash, String> = HashMap::new();
    let mut stats = ExportStats::default();

    let mut manifest = String::new();
    manifest.push_str(archive.kind.as_str());
    manifest.push('\n');

    for entry in &archive.entries {
        debug!("processing {}", entry.name());
        if entry.name().is_empty() {
            warn!("entry at offset {} has no name and will not be reassembled", entry.offset());
            stats.unnamed += 1;
        }

        if entry.is_virtual() {
            manifest.push_str(&virtual_line(entry.name()));
            manifest.push('\n');
            stats.virtual_entries += 1;
            continue;
        }

        let hash = entry.hash();
        let filename = match exported.get(&hash) {
            Some(previous) => {
                warn!("{} duplicates {previous}; creating reference only", entry.name());
                stats.references += 1;
                previous.clone()
            }
            None => {
                let filename = names.claim(&sanitize_file_name(entry.name()));
                let kind = classify(entry.data());
                debug!("creating {filename}, type {kind}");

                sink.write_file(&filename, entry.data())?;
                stats.files_written += 1;
                if opts.convert_media {
                    write_converted(sink, &filename, kind, entry.data(), &mut stats)?;
                }
                exported.insert(hash, filename.clone());
                filename
            }
        };

        manifest.push_str(&content_line(entry.name(), &filename, &hash));
        manifest.push('\n');
    }

    Ok((manifest, stats))
}

/// Conversion failures only cost the derived copy; sink I/O errors still abort.
fn write_converted(
    sink: &mut dyn ExportSink,
    filename: &str,
    kind: MediaKind,
    data: &[u8],
    stats: &mut ExportStats,
) -> WadResult<()> {
    match convert_as(kind, data) {
        Ok(converted) => {
            sink.write_media(filename, &converted)?;
            stats.converted += 1;
        }
        Err(e) if kind == MediaKind::Unknown => {
            debug!("{filename} is not a picture: {e}");
            stats.conversion_failures += 1;
        }
        Err(e) => {
            warn!("unable to convert {filename} ({kind}): {e}");
            stats.conversion_failures += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wad::format::{Entry, WadKind};
    use crate::wad::manifest::Manifest;

    #[derive(Default)]
    struct MemorySink {
        files: Vec<(String, Vec<u8>)>,
        media: Vec<String>,
    }

    impl ExportSink for MemorySink {
        fn write_file(&mut self, filename: &str, data: &[u8]) -> WadResult<()> {
            self.files.push((filename.to_string(), data.to_vec()));
            Ok(())
        }

        fn write_media(&mut self, filename: &str, converted: &Converted) -> WadResult<()> {
            self.media.push(format!("{filename}.{}", converted.extension));
            Ok(())
        }
    }

    fn archive() -> WadArchive {
        let mut mus = b"MUS\x1A".to_vec();
        mus.extend_from_slice(&[0u8; 10]);
        mus.extend_from_slice(&[0x10, 60, 0x60]);

        WadArchive {
            kind: WadKind::Pwad,
            entries: vec![
                Entry::new("D_E1M1", 12, mus),
                Entry::marker("S_START"),
                Entry::new("THING", 40, b"abc".to_vec()),
                Entry::new("THING", 43, b"xyz".to_vec()),
                Entry::new("COPY", 12, b"abc".to_vec()),
                Entry::new("VILE\\", 46, b"RIFFdata".to_vec()),
            ],
        }
    }

    #[test]
    fn duplicates_become_references() {
        let mut sink = MemorySink::default();
        let (text, stats) = export(&archive(), &mut sink, &ExportOptions::default()).unwrap();

        let written: Vec<_> = sink.files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(written, ["D_E1M1", "THING", "THING_0", "VILE_"]);
        assert_eq!(stats.files_written, 4);
        assert_eq!(stats.references, 1);
        assert_eq!(stats.virtual_entries, 1);

        let manifest = Manifest::parse(&text).unwrap();
        assert_eq!(manifest.kind, WadKind::Pwad);
        let copy = &manifest.lines[4];
        assert_eq!(copy.name, "COPY");
        assert_eq!(copy.filename.as_deref(), Some("THING"));
        assert_eq!(copy.hash, Some(ContentHash::of(b"abc").hex()));
        assert!(manifest.lines[1].is_virtual());
    }

    #[test]
    fn recognized_media_gets_a_converted_copy() {
        let mut sink = MemorySink::default();
        let (_, stats) = export(&archive(), &mut sink, &ExportOptions::default()).unwrap();
        assert_eq!(sink.media, ["D_E1M1.MID", "VILE_.WAV"]);
        assert_eq!(stats.converted, 2);
        // "abc" and "xyz" are not pictures
        assert_eq!(stats.conversion_failures, 2);
    }

    #[test]
    fn unnamed_entries_are_counted() {
        let archive = WadArchive {
            kind: WadKind::Iwad,
            entries: vec![Entry::new("", 12, b"data".to_vec()), Entry::marker("")],
        };
        let mut sink = MemorySink::default();
        let (text, stats) = export(&archive, &mut sink, &ExportOptions::default()).unwrap();
        assert_eq!(stats.unnamed, 2);

        let manifest = Manifest::parse(&text).unwrap();
        assert!(manifest.lines.iter().all(|l| !l.is_valid()));
    }

    #[test]
    fn conversion_can_be_disabled() {
        let mut sink = MemorySink::default();
        let opts = ExportOptions {
            convert_media: false,
        };
        let (_, stats) = export(&archive(), &mut sink, &opts).unwrap();
        assert!(sink.media.is_empty());
        assert_eq!(stats.converted, 0);
        assert_eq!(stats.files_written, 4);
    }
}
