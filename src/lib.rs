#![forbid(unsafe_code)]

//! WAD archive tooling: decode archives, export them to loose files plus an
//! `!INDEX.TXT` manifest, assemble them back with content dedup, and convert
//! embedded media (MUS scores, raw sound lumps, pictures) to common formats.

pub mod media;
pub mod wad;
