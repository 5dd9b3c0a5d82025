#![forbid(unsafe_code)]

mod dispatch;
mod error;
mod mus;
mod picture;
mod sniff;
mod wav;

pub use dispatch::{convert, convert_as, Converted};
pub use error::MediaError;
pub use mus::{mus_to_midi, MusHeader, MIDI_DIVISION};
pub use picture::{decode_picture, picture_to_png};
pub use sniff::{classify, is_mus, MediaKind, MUS_MAGIC};
pub use wav::{raw_audio_to_wav, write_wav_header, DmxSound, SAMPLE_RATE, WAV_HEADER_LEN};
