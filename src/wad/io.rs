#![forbid(unsafe_code)]

use std::io::{Read, Write};

use crate::wad::error::{WadError, WadResult};

pub fn write_i32(w: &mut dyn Write, v: i32) -> WadResult<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn read_exact<const N: usize>(r: &mut dyn Read) -> WadResult<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => WadError::Format("truncated archive".into()),
        _ => WadError::Io(e),
    })?;
    Ok(buf)
}

pub fn read_i32(r: &mut dyn Read) -> WadResult<i32> {
    Ok(i32::from_le_bytes(read_exact::<4>(r)?))
}

/// Directory fields are signed on disk. Offsets past `i32::MAX` are refused.
pub fn to_disk_i32(v: u64, what: &str) -> WadResult<i32> {
    i32::try_from(v).map_err(|_| WadError::Format(format!("{what} {v} exceeds 2 GiB limit")))
}

pub fn hex32(v: &[u8; 32]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = [0u8; 64];
    for (i, b) in v.iter().copied().enumerate() {
        out[i * 2] = HEX[(b >> 4) as usize];
        out[i * 2 + 1] = HEX[(b & 0xF) as usize];
    }
    String::from_utf8_lossy(&out).into_owned()
}
