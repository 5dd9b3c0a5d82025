#![forbid(unsafe_code)]

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::media::error::MediaError;

/// Output rate for converted sound lumps. The rate stored in the lump header
/// is not used.
pub const SAMPLE_RATE: u32 = 11025;

/// `RIFF` + `fmt ` + `data` headers for plain PCM.
pub const WAV_HEADER_LEN: usize = 44;

const DMX_FORMAT: u16 = 3;
const DMX_HEADER_LEN: usize = 8;

/// Raw 8-bit sound lump: `u16 format (3), u16 rate, u16 sample count, u16 0`
/// followed by exactly `sample count` unsigned samples.
#[derive(Debug, Clone, Copy)]
pub struct DmxSound<'a> {
    pub rate: u16,
    pub samples: &'a [u8],
}

impl<'a> DmxSound<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, MediaError> {
        if data.len() < DMX_HEADER_LEN {
            return Err(MediaError::BadSound("too short".into()));
        }
        let word = |i: usize| u16::from_le_bytes([data[i], data[i + 1]]);

        if word(0) != DMX_FORMAT {
            return Err(MediaError::BadSound(format!("format {} is not 3", word(0))));
        }
        if word(6) != 0 {
            return Err(MediaError::BadSound("reserved field is not zero".into()));
        }
        let count = word(4) as usize;
        let samples = &data[DMX_HEADER_LEN..];
        if samples.len() != count {
            return Err(MediaError::BadSound(format!(
                "header declares {count} samples, payload has {}",
                samples.len()
            )));
        }

        Ok(DmxSound {
            rate: word(2),
            samples,
        })
    }
}

/// Writes a canonical 44-byte PCM header for `sample_count` frames.
pub fn write_wav_header(
    w: &mut dyn Write,
    sample_count: u32,
    rate: u32,
    channels: u16,
    bits: u16,
) -> std::io::Result<()> {
    let block_align = channels * bits / 8;
    let data_len = sample_count * u32::from(block_align);

    w.write_all(b"RIFF")?;
    w.write_u32::<LittleEndian>(data_len + WAV_HEADER_LEN as u32 - 8)?;
    w.write_all(b"WAVE")?;

    w.write_all(b"fmt ")?;
    w.write_u32::<LittleEndian>(16)?;
    w.write_u16::<LittleEndian>(1)?; // PCM
    w.write_u16::<LittleEndian>(channels)?;
    w.write_u32::<LittleEndian>(rate)?;
    w.write_u32::<LittleEndian>(rate * u32::from(block_align))?;
    w.write_u16::<LittleEndian>(block_align)?;
    w.write_u16::<LittleEndian>(bits)?;

    w.write_all(b"data")?;
    w.write_u32::<LittleEndian>(data_len)?;
    Ok(())
}

/// Converts a raw sound lump to a mono 8-bit RIFF/WAVE file. Samples are
/// copied verbatim.
pub fn raw_audio_to_wav(data: &[u8]) -> Result<Vec<u8>, MediaError> {
    let sound = DmxSound::parse(data)?;

    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + sound.samples.len());
    write_wav_header(&mut wav, sound.samples.len() as u32, SAMPLE_RATE, 1, 8)?;
    wav.extend_from_slice(sound.samples);
    Ok(wav)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lump(samples: &[u8]) -> Vec<u8> {
        let mut v = vec![0x03, 0x00, 0x11, 0x2B];
        v.extend_from_slice(&(samples.len() as u16).to_le_bytes());
        v.extend_from_slice(&[0, 0]);
        v.extend_from_slice(samples);
        v
    }

    #[test]
    fn header_layout() {
        let mut h = Vec::new();
        write_wav_header(&mut h, 100, SAMPLE_RATE, 1, 8).unwrap();
        assert_eq!(h.len(), WAV_HEADER_LEN);
        assert_eq!(&h[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(h[4..8].try_into().unwrap()), 136);
        assert_eq!(&h[8..16], b"WAVEfmt ");
        assert_eq!(u16::from_le_bytes([h[20], h[21]]), 1);
        assert_eq!(u16::from_le_bytes([h[22], h[23]]), 1);
        assert_eq!(u32::from_le_bytes(h[24..28].try_into().unwrap()), 11025);
        assert_eq!(u32::from_le_bytes(h[28..32].try_into().unwrap()), 11025);
        assert_eq!(u16::from_le_bytes([h[34], h[35]]), 8);
        assert_eq!(&h[36..40], b"data");
        assert_eq!(u32::from_le_bytes(h[40..44].try_into().unwrap()), 100);
    }

    #[test]
    fn samples_follow_header_verbatim() {
        let wav = raw_audio_to_wav(&lump(&[1, 2, 3, 250])).unwrap();
        assert_eq!(wav.len(), 48);
        assert_eq!(&wav[44..], &[1, 2, 3, 250]);
    }

    #[test]
    fn mis_sized_payload_is_rejected() {
        let mut data = lump(&[1, 2, 3]);
        data.push(9);
        assert!(matches!(raw_audio_to_wav(&data), Err(MediaError::BadSound(_))));
        assert!(raw_audio_to_wav(&[0x03, 0x00, 0x11]).is_err());
    }

    #[test]
    fn zero_sample_lump_is_header_only() {
        let wav = raw_audio_to_wav(&lump(&[])).unwrap();
        assert_eq!(wav.len(), WAV_HEADER_LEN);
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 0);
    }

    #[test]
    fn parse_keeps_declared_rate() {
        let data = lump(&[5; 10]);
        let s = DmxSound::parse(&data).unwrap();
        assert_eq!(s.rate, 11025);
        assert_eq!(s.samples.len(), 10);
    }
}
