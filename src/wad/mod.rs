#![forbid(unsafe_code)]

mod build;
mod error;
mod export;
mod format;
mod io;
mod manifest;
mod ops;
mod path;
mod read;

pub use build::{assemble, AssembleStats};
pub use error::{WadError, WadResult};
pub use export::{export, DirSink, ExportOptions, ExportSink, ExportStats, MEDIA_DIR};
pub use format::{ContentHash, Entry, WadArchive, WadKind, DIR_ENTRY_LEN, HEADER_LEN, NAME_LEN};
pub use manifest::{content_line, virtual_line, Manifest, ManifestLine, INDEX_FILE};
pub use ops::{assemble_dir, convert_file, export_dir, list};
pub use path::{sanitize_file_name, NameRegistry};
