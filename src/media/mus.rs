#![forbid(unsafe_code)]

//! MUS score to Standard MIDI (format 0, one track).
//!
//! The track is built in memory so its length is known before anything is
//! written; the result is `MThd` + `MTrk` + length + events in a single buffer.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::media::error::MediaError;
use crate::media::sniff::is_mus;

/// Ticks per quarter note in the emitted header.
pub const MIDI_DIVISION: u16 = 70;

/// `magic + 5 x u16`.
pub const MUS_HEADER_LEN: usize = 14;

const CHANNELS: usize = 16;
const MUS_PERCUSSION: u8 = 15;
const MIDI_PERCUSSION: u8 = 9;
const DEFAULT_VELOCITY: u8 = 127;
const MAX_DELAY: u32 = 0x0FFF_FFFF;

/// MUS controller number -> MIDI controller.
const CONTROLLER_MAP: [u8; 15] = [
    0x00, 0x20, 0x01, 0x07, 0x0A, 0x0B, 0x5B, 0x5D, 0x40, 0x43, 0x78, 0x7B, 0x7E, 0x7F, 0x79,
];

const MIDI_RELEASE_KEY: u8 = 0x80;
const MIDI_PRESS_KEY: u8 = 0x90;
const MIDI_CHANGE_CONTROLLER: u8 = 0xB0;
const MIDI_CHANGE_PATCH: u8 = 0xC0;
const MIDI_PITCH_WHEEL: u8 = 0xE0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MusHeader {
    pub score_len: u16,
    pub score_start: u16,
    pub primary_channels: u16,
    pub secondary_channels: u16,
    pub instruments: u16,
}

impl MusHeader {
    pub fn parse(data: &[u8]) -> Result<Self, MediaError> {
        if !is_mus(data) || data.len() < MUS_HEADER_LEN {
            return Err(MediaError::BadMusHeader);
        }
        let mut cur = Cursor::new(&data[4..MUS_HEADER_LEN]);
        let mut field = || cur.read_u16::<LittleEndian>().map_err(|_| MediaError::BadMusHeader);
        Ok(MusHeader {
            score_len: field()?,
            score_start: field()?,
            primary_channels: field()?,
            secondary_channels: field()?,
            instruments: field()?,
        })
    }

    /// Offset of the first event. A start inside the header means the events
    /// follow it directly.
    fn events_offset(&self, total: usize) -> Result<usize, MediaError> {
        let start = usize::from(self.score_start).max(MUS_HEADER_LEN);
        if start > total {
            return Err(MediaError::BadMusHeader);
        }
        Ok(start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MusEvent {
    ReleaseKey,
    PressKey,
    PitchWheel,
    SystemEvent,
    ChangeController,
    ScoreEnd,
}

impl MusEvent {
    fn from_descriptor(descriptor: u8) -> Result<Self, MediaError> {
        match (descriptor >> 4) & 0x07 {
            0 => Ok(MusEvent::ReleaseKey),
            1 => Ok(MusEvent::PressKey),
            2 => Ok(MusEvent::PitchWheel),
            3 => Ok(MusEvent::SystemEvent),
            4 => Ok(MusEvent::ChangeController),
            6 => Ok(MusEvent::ScoreEnd),
            other => Err(MediaError::InvalidMusEvent(other)),
        }
    }
}

/// Per-call channel allocation and velocity memory.
#[derive(Debug)]
struct ChannelState {
    map: [Option<u8>; CHANNELS],
    velocity: [u8; CHANNELS],
}

impl ChannelState {
    fn new() -> Self {
        Self {
            map: [None; CHANNELS],
            velocity: [DEFAULT_VELOCITY; CHANNELS],
        }
    }

    /// MUS channel 15 is always the MIDI percussion channel. Other channels get
    /// the lowest free MIDI channel on first use.
    fn midi_channel(&mut self, mus_channel: u8) -> Result<u8, MediaError> {
        if mus_channel == MUS_PERCUSSION {
            return Ok(MIDI_PERCUSSION);
        }
        let slot = usize::from(mus_channel & 0x0F);
        if let Some(ch) = self.map[slot] {
            return Ok(ch);
        }

        let ch = (0..CHANNELS as u8)
            .filter(|&c| c != MIDI_PERCUSSION)
            .find(|c| !self.map.contains(&Some(*c)))
            .ok_or(MediaError::ChannelsExhausted)?;
        self.map[slot] = Some(ch);
        Ok(ch)
    }
}

/// Track body under construction. Time advances only between event groups and
/// is flushed in front of the next emitted event.
#[derive(Debug, Default)]
struct TrackWriter {
    body: Vec<u8>,
    pending: u32,
}

impl TrackWriter {
    fn delay(&mut self, ticks: u32) -> Result<(), MediaError> {
        self.pending = self
            .pending
            .checked_add(ticks)
            .filter(|&t| t <= MAX_DELAY)
            .ok_or(MediaError::DelayOverflow)?;
        Ok(())
    }

    fn event(&mut self, bytes: &[u8]) {
        write_vlq(&mut self.body, self.pending);
        self.pending = 0;
        self.body.extend_from_slice(bytes);
    }

    fn end_of_track(&mut self) {
        self.event(&[0xFF, 0x2F, 0x00]);
    }
}

/// MIDI variable-length quantity, most significant group first.
fn write_vlq(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut n = 0;
    let mut v = value;
    loop {
        groups[n] = (v & 0x7F) as u8;
        n += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let cont = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | cont);
    }
}

struct EventReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl EventReader<'_> {
    fn byte(&mut self) -> Result<u8, MediaError> {
        let b = *self.data.get(self.pos).ok_or(MediaError::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    fn delay(&mut self) -> Result<u32, MediaError> {
        let mut value: u32 = 0;
        loop {
            let b = self.byte()?;
            value = value
                .checked_mul(128)
                .and_then(|v| v.checked_add(u32::from(b & 0x7F)))
                .ok_or(MediaError::DelayOverflow)?;
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }
    }
}

/// Transcodes a complete MUS lump. Any malformed header or event aborts the
/// conversion; no partial output is returned.
pub fn mus_to_midi(data: &[u8]) -> Result<Vec<u8>, MediaError> {
    let header = MusHeader::parse(data)?;
    let mut reader = EventReader {
        data,
        pos: header.events_offset(data.len())?,
    };
    let mut channels = ChannelState::new();
    let mut track = TrackWriter::default();

    'score: loop {
        loop {
            let descriptor = reader.byte()?;
            let mus_channel = descriptor & 0x0F;

            match MusEvent::from_descriptor(descriptor)? {
                MusEvent::ReleaseKey => {
                    let ch = channels.midi_channel(mus_channel)?;
                    let key = reader.byte()?;
                    track.event(&[MIDI_RELEASE_KEY | ch, key & 0x7F, 0]);
                }
                MusEvent::PressKey => {
                    let ch = channels.midi_channel(mus_channel)?;
                    let key = reader.byte()?;
                    if key & 0x80 != 0 {
                        channels.velocity[usize::from(ch)] = reader.byte()? & 0x7F;
                    }
                    let velocity = channels.velocity[usize::from(ch)];
                    track.event(&[MIDI_PRESS_KEY | ch, key & 0x7F, velocity]);
                }
                MusEvent::PitchWheel => {
                    let ch = channels.midi_channel(mus_channel)?;
                    let wheel = u16::from(reader.byte()?) * 64;
                    track.event(&[
                        MIDI_PITCH_WHEEL | ch,
                        (wheel & 0x7F) as u8,
                        ((wheel >> 7) & 0x7F) as u8,
                    ]);
                }
                MusEvent::SystemEvent => {
                    let ch = channels.midi_channel(mus_channel)?;
                    let controller = reader.byte()?;
                    if !(10..=14).contains(&controller) {
                        return Err(MediaError::InvalidSystemEvent(controller));
                    }
                    let mapped = CONTROLLER_MAP[usize::from(controller)];
                    track.event(&[MIDI_CHANGE_CONTROLLER | ch, mapped, 0]);
                }
                MusEvent::ChangeController => {
                    let ch = channels.midi_channel(mus_channel)?;
                    let controller = reader.byte()?;
                    let value = reader.byte()?;
                    match controller {
                        0 => track.event(&[MIDI_CHANGE_PATCH | ch, value & 0x7F]),
                        1..=9 => {
                            let mapped = CONTROLLER_MAP[usize::from(controller)];
                            track.event(&[MIDI_CHANGE_CONTROLLER | ch, mapped, value.min(0x7F)]);
                        }
                        other => return Err(MediaError::InvalidController(other)),
                    }
                }
                MusEvent::ScoreEnd => break 'score,
            }

            if descriptor & 0x80 != 0 {
                break;
            }
        }

        let ticks = reader.delay()?;
        track.delay(ticks)?;
    }

    track.end_of_track();
    Ok(midi_file(&track.body))
}

fn midi_file(track: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(22 + track.len());
    out.extend_from_slice(b"MThd");
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // format 0
    out.extend_from_slice(&1u16.to_be_bytes()); // one track
    out.extend_from_slice(&MIDI_DIVISION.to_be_bytes());
    out.extend_from_slice(b"MTrk");
    out.extend_from_slice(&(track.len() as u32).to_be_bytes());
    out.extend_from_slice(track);
    out
}
