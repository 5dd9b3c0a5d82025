#![forbid(unsafe_code)]

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::media::convert;
use crate::wad::build::{assemble, AssembleStats};
use crate::wad::error::WadResult;
use crate::wad::export::{export, DirSink, ExportOptions, ExportStats};
use crate::wad::format::WadArchive;
use crate::wad::manifest::{Manifest, INDEX_FILE};
use crate::wad::path::sanitize_file_name;

/// Prints the archive kind, then one line per entry. Verbose lines are
/// `name;filename;offset;size;hash`.
pub fn list(wad: &Path, verbose: bool, out: &mut dyn Write) -> WadResult<()> {
    let archive = WadArchive::open(wad)?;

    writeln!(out, "{}", archive.kind)?;
    for e in &archive.entries {
        if verbose {
            writeln!(
                out,
                "{};{};{};{};{}",
                e.name(),
                sanitize_file_name(e.name()),
                e.offset(),
                e.len(),
                e.hash()
            )?;
        } else {
            writeln!(out, "{}", e.name())?;
        }
    }
    Ok(())
}

/// Exports every entry into `output` and writes the index file next to them.
pub fn export_dir(wad: &Path, output: &Path, opts: &ExportOptions) -> WadResult<ExportStats> {
    let archive = WadArchive::open(wad)?;
    debug!("exporting to {}", output.display());

    let mut sink = DirSink::create(output)?;
    let (manifest, stats) = export(&archive, &mut sink, opts)?;
    std::fs::write(sink.root().join(INDEX_FILE), manifest)?;

    info!(
        "exported {} files ({} references, {} virtual, {} converted)",
        stats.files_written, stats.references, stats.virtual_entries, stats.converted
    );
    Ok(stats)
}

/// Builds `output` from the index file and loose files in `input`.
pub fn assemble_dir(input: &Path, output: &Path) -> WadResult<AssembleStats> {
    let manifest = Manifest::load(input)?;
    debug!("assembling {} from {}", output.display(), input.display());

    if output.exists() {
        warn!("overwriting existing file: {}", output.display());
    }
    let mut out = BufWriter::new(File::create(output)?);
    let stats = assemble(&manifest, input, &mut out)?;
    out.flush()?;
    Ok(stats)
}

/// Sniffs one file and writes its converted form to `<stem>.<EXT>`.
pub fn convert_file(input: &Path, stem: &Path) -> WadResult<PathBuf> {
    let data = std::fs::read(input)?;
    let converted = convert(&data)?;

    let mut name = OsString::from(stem.as_os_str());
    name.push(".");
    name.push(converted.extension);
    let output = PathBuf::from(name);

    std::fs::write(&output, &converted.bytes)?;
    info!("wrote {}", output.display());
    Ok(output)
}
