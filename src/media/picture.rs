#![forbid(unsafe_code)]

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use image::{GrayAlphaImage, ImageFormat, LumaA};

use crate::media::error::MediaError;

const MAX_DIMENSION: u16 = 4096;
const POST_END: u8 = 0xFF;

fn bad(msg: impl Into<String>) -> MediaError {
    MediaError::BadPicture(msg.into())
}

/// Decodes a column-post picture.
///
/// Layout: `u16 width, u16 height, i16 left, i16 top`, `width` column offsets
/// (u32, from the start of the lump), then per column a run of posts
/// `[top_delta][len][pad][len pixels][pad]` closed by `top_delta == 0xFF`.
///
/// There is no palette in the lump, so each palette index becomes a gray
/// level. Pixels no post covers stay transparent.
pub fn decode_picture(data: &[u8]) -> Result<GrayAlphaImage, MediaError> {
    let mut cur = Cursor::new(data);
    let mut header = || cur.read_u16::<LittleEndian>().map_err(|_| bad("truncated header"));
    let width = header()?;
    let height = header()?;
    let _left = header()?;
    let _top = header()?;

    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(bad(format!("implausible size {width}x{height}")));
    }

    let mut columns = Vec::with_capacity(usize::from(width));
    for _ in 0..width {
        let offset = cur
            .read_u32::<LittleEndian>()
            .map_err(|_| bad("truncated column table"))?;
        columns.push(offset as usize);
    }

    let mut img = GrayAlphaImage::new(u32::from(width), u32::from(height));
    for (x, &start) in columns.iter().enumerate() {
        let mut pos = start;
        loop {
            let top = *data.get(pos).ok_or_else(|| bad(format!("column {x} outside lump")))?;
            if top == POST_END {
                break;
            }
            let len = usize::from(*data.get(pos + 1).ok_or_else(|| bad("truncated post"))?);
            let pixels = data
                .get(pos + 3..pos + 3 + len)
                .ok_or_else(|| bad(format!("post in column {x} outside lump")))?;

            for (i, &index) in pixels.iter().enumerate() {
                let y = usize::from(top) + i;
                if y >= usize::from(height) {
                    return Err(bad(format!("post in column {x} below image")));
                }
                img.put_pixel(x as u32, y as u32, LumaA([index, 0xFF]));
            }
            pos += len + 4;
        }
    }

    Ok(img)
}

pub fn picture_to_png(data: &[u8]) -> Result<Vec<u8>, MediaError> {
    let img = decode_picture(data)?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x3 picture: column 0 has one post at row 1, column 1 is empty.
    fn sample() -> Vec<u8> {
        let mut v = Vec::new();
        for field in [2u16, 3, 0, 0] {
            v.extend_from_slice(&field.to_le_bytes());
        }
        v.extend_from_slice(&16u32.to_le_bytes());
        v.extend_from_slice(&23u32.to_le_bytes());
        v.extend_from_slice(&[1, 2, 0, 40, 50, 0, 0xFF]);
        v.push(0xFF);
        v
    }

    #[test]
    fn posts_land_in_their_rows() {
        let img = decode_picture(&sample()).unwrap();
        assert_eq!(img.dimensions(), (2, 3));
        assert_eq!(img.get_pixel(0, 0), &LumaA([0, 0]));
        assert_eq!(img.get_pixel(0, 1), &LumaA([40, 255]));
        assert_eq!(img.get_pixel(0, 2), &LumaA([50, 255]));
        assert_eq!(img.get_pixel(1, 1), &LumaA([0, 0]));
    }

    #[test]
    fn encodes_png() {
        let png = picture_to_png(&sample()).unwrap();
        assert!(png.starts_with(b"\x89PNG"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_picture(&[1, 2, 3]).is_err());
        assert!(decode_picture(&[0, 0, 1, 0, 0, 0, 0, 0]).is_err());

        let mut v = sample();
        v[8..12].copy_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(decode_picture(&v), Err(MediaError::BadPicture(_))));

        let mut tall = sample();
        tall[16] = 2; // post starts at row 2, runs past height 3
        assert!(decode_picture(&tall).is_err());
    }
}
