use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{ProtoError, Result};

/// Compress one raw block at maximum ratio, prefixed with a 2-byte
/// big-endian raw-size header. The header endianness is the opposite of the
/// frame length field; the deployed firmware expects exactly this layout.
pub fn compress_block(raw: &[u8]) -> Result<Vec<u8>> {
    debug_assert!(raw.len() <= u16::MAX as usize);
    let mut out = Vec::with_capacity(raw.len() / 2 + 16);
    out.extend_from_slice(&(raw.len() as u16).to_be_bytes());
    let mut enc = ZlibEncoder::new(out, Compression::best());
    enc.write_all(raw)?;
    Ok(enc.finish()?)
}

/// Inverse of [`compress_block`]. The size header is informational only;
/// the zlib stream's own end determines the output length.
pub fn decompress_block(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 2 {
        return Err(ProtoError::ShortResponse {
            got: data.len(),
            need: 2,
        });
    }
    let mut out = Vec::with_capacity(u16::from_be_bytes([data[0], data[1]]) as usize);
    ZlibDecoder::new(&data[2..]).read_to_end(&mut out)?;
    Ok(out)
}
