#![forbid(unsafe_code)]

use std::fmt;

use crate::media::wav::DmxSound;

/// Header of a MUS score, shared by the sniffer and the transcoder.
pub const MUS_MAGIC: [u8; 4] = *b"MUS\x1A";

/// Closed set of payload formats found in archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Xm,
    It,
    Wav,
    Mp3,
    Mid,
    Mus,
    Ogg,
    RawAudio,
    /// Anything else. Treated as a column-post picture on export.
    Unknown,
    /// Empty buffer.
    Virtual,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Xm => "XM",
            MediaKind::It => "IT",
            MediaKind::Wav => "WAV",
            MediaKind::Mp3 => "MP3",
            MediaKind::Mid => "MID",
            MediaKind::Mus => "MUS",
            MediaKind::Ogg => "OGG",
            MediaKind::RawAudio => "RAWAUDIO",
            MediaKind::Unknown => "UNKNOWN",
            MediaKind::Virtual => "VIRTUAL",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_mus(data: &[u8]) -> bool {
    data.starts_with(&MUS_MAGIC)
}

/// Prefix rules, first match wins.
pub fn classify(data: &[u8]) -> MediaKind {
    if data.is_empty() {
        MediaKind::Virtual
    } else if data.starts_with(b"Extended Module") {
        MediaKind::Xm
    } else if data.starts_with(b"IMPM") {
        MediaKind::It
    } else if data.starts_with(b"RIFF") {
        MediaKind::Wav
    } else if data.starts_with(b"ID3") {
        MediaKind::Mp3
    } else if data.starts_with(b"MThd") {
        MediaKind::Mid
    } else if is_mus(data) {
        MediaKind::Mus
    } else if data.starts_with(b"OggS") {
        MediaKind::Ogg
    } else if DmxSound::parse(data).is_ok() {
        MediaKind::RawAudio
    } else {
        MediaKind::Unknown
    }
}
