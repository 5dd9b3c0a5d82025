#![forbid(unsafe_code)]

use thiserror::Error;

use crate::media::sniff::MediaKind;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("no converter for {0} data")]
    NoConverter(MediaKind),

    #[error("bad MUS header")]
    BadMusHeader,

    #[error("MUS stream ends unexpectedly")]
    UnexpectedEof,

    #[error("invalid MUS event kind {0}")]
    InvalidMusEvent(u8),

    #[error("invalid MUS system event {0}")]
    InvalidSystemEvent(u8),

    #[error("invalid MUS controller {0}")]
    InvalidController(u8),

    #[error("MUS delay exceeds MIDI time range")]
    DelayOverflow,

    #[error("all MIDI channels are already allocated")]
    ChannelsExhausted,

    #[error("bad sound lump: {0}")]
    BadSound(String),

    #[error("bad picture: {0}")]
    BadPicture(String),

    #[error("image: {0}")]
    Image(#[from] image::ImageError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
