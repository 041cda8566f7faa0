use crate::error::{ProtoError, Result};
use crate::port::Channel;

pub const FRAME_MAGIC: u8 = 0x1B;
/// Largest payload a single frame may carry.
pub const MAX_PAYLOAD: usize = 0xFFFF - 16;

/// Wrapping 8-bit sum; the wire uses this at the frame level and again per
/// bitstream block. Not a CRC, kept for firmware compatibility.
pub fn additive_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Fill `buf` completely or report a timeout. The channel returns short
/// reads when its timeout elapses.
fn read_exact(ch: &mut dyn Channel, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = ch.read(&mut buf[filled..])?;
        if n == 0 {
            return Err(ProtoError::Timeout);
        }
        filled += n;
    }
    Ok(())
}

/// Wrap `payload` in a frame: magic, little-endian length covering payload
/// plus the trailing checksum byte, payload, checksum over payload only.
pub fn write_frame(ch: &mut dyn Channel, payload: &[u8]) -> Result<()> {
    if payload.len() >= MAX_PAYLOAD {
        return Err(ProtoError::Oversized(payload.len()));
    }
    let mut out = Vec::with_capacity(payload.len() + 4);
    out.push(FRAME_MAGIC);
    out.extend_from_slice(&((payload.len() as u16 + 1).to_le_bytes()));
    out.extend_from_slice(payload);
    out.push(additive_checksum(payload));
    ch.write_all(&out)?;
    Ok(())
}

/// Read one frame and return its payload with the checksum verified and
/// stripped. `Timeout` is a soft outcome; magic or checksum mismatches mean
/// the stream is desynchronized and the channel must be reopened.
pub fn read_frame(ch: &mut dyn Channel) -> Result<Vec<u8>> {
    let mut magic = [0u8; 1];
    read_exact(ch, &mut magic)?;
    if magic[0] != FRAME_MAGIC {
        return Err(ProtoError::BadMagic(magic[0]));
    }

    let mut len = [0u8; 2];
    read_exact(ch, &mut len)?;
    let n = u16::from_le_bytes(len) as usize;
    if n == 0 {
        // length always counts the checksum byte
        return Err(ProtoError::ShortResponse { got: 0, need: 1 });
    }

    let mut data = vec![0u8; n];
    read_exact(ch, &mut data)?;

    let received = data[n - 1];
    let computed = additive_checksum(&data[..n - 1]);
    if computed != received {
        return Err(ProtoError::Checksum { computed, received });
    }

    data.truncate(n - 1);
    Ok(data)
}
