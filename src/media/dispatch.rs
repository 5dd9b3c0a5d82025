#![forbid(unsafe_code)]

use crate::media::error::MediaError;
use crate::media::mus::mus_to_midi;
use crate::media::picture::picture_to_png;
use crate::media::sniff::{classify, MediaKind};
use crate::media::wav::raw_audio_to_wav;

/// A payload rewritten into a common format.
#[derive(Debug, Clone)]
pub struct Converted {
    /// Upper-case file extension without the dot.
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Sniffs `data` and converts it.
pub fn convert(data: &[u8]) -> Result<Converted, MediaError> {
    convert_as(classify(data), data)
}

/// Converts `data` already classified as `kind`.
pub fn convert_as(kind: MediaKind, data: &[u8]) -> Result<Converted, MediaError> {
    let (extension, bytes) = match kind {
        MediaKind::Xm
        | MediaKind::It
        | MediaKind::Wav
        | MediaKind::Mp3
        | MediaKind::Mid
        | MediaKind::Ogg => (kind.as_str(), data.to_vec()),
        MediaKind::Mus => ("MID", mus_to_midi(data)?),
        MediaKind::RawAudio => ("WAV", raw_audio_to_wav(data)?),
        MediaKind::Unknown => ("PNG", picture_to_png(data)?),
        MediaKind::Virtual => return Err(MediaError::NoConverter(kind)),
    };
    Ok(Converted { extension, bytes })
}
