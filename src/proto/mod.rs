pub mod compress;

use crate::error::{ProtoError, Result};

/// Raw bitstream bytes carried by one ProgramBlock command.
pub const BLOCK_SIZE: usize = 4096 - 32;

/// Commands the programmer firmware understands. The transport prepends
/// `[command id, counter]` before framing; everything here is the payload
/// that follows, all multi-byte integers little-endian.
#[derive(Debug, Clone)]
pub enum Command {
    Echo(Vec<u8>),
    QueryDevice,
    ProgramDevice {
        save_to_flash: bool,
        total_size: u32,
        block_count: u32,
        bitstream_crc: u16,
    },
    ProgramBlock {
        block_id: u16,
        compressed_size: u16,
        raw_size: u16,
        checksum: u8,
        data: Vec<u8>,
    },
    ProgramComplete,
    QueryBitstreamFlash,
    ClearBitstreamFlash,
    RebootProgrammer,
}

impl Command {
    pub fn id(&self) -> u8 {
        match self {
            Command::Echo(_) => 0x00,
            Command::QueryDevice => 0x01,
            Command::ProgramDevice { .. } => 0x02,
            Command::ProgramBlock { .. } => 0x03,
            Command::ProgramComplete => 0x04,
            Command::QueryBitstreamFlash => 0x05,
            // 0x06 is ProgramBitstreamFromFlash, issued by the firmware
            // itself on startup, never by the host
            Command::ClearBitstreamFlash => 0x07,
            Command::RebootProgrammer => 0x08,
        }
    }

    pub fn encode_payload(&self) -> Vec<u8> {
        match self {
            Command::Echo(data) => data.clone(),
            // one filler byte, as the deployed firmware expects
            Command::QueryDevice => vec![0],
            Command::ProgramDevice {
                save_to_flash,
                total_size,
                block_count,
                bitstream_crc,
            } => {
                let mut out = Vec::with_capacity(11);
                out.push(u8::from(*save_to_flash));
                out.extend_from_slice(&total_size.to_le_bytes());
                out.extend_from_slice(&block_count.to_le_bytes());
                out.extend_from_slice(&bitstream_crc.to_le_bytes());
                out
            }
            Command::ProgramBlock {
                block_id,
                compressed_size,
                raw_size,
                checksum,
                data,
            } => {
                let mut out = Vec::with_capacity(7 + data.len());
                out.extend_from_slice(&block_id.to_le_bytes());
                out.extend_from_slice(&compressed_size.to_le_bytes());
                out.extend_from_slice(&raw_size.to_le_bytes());
                out.push(*checksum);
                out.extend_from_slice(data);
                out
            }
            Command::ProgramComplete
            | Command::QueryBitstreamFlash
            | Command::ClearBitstreamFlash
            | Command::RebootProgrammer => Vec::new(),
        }
    }
}

/// Response payloads decode from fixed offsets; which decoder runs is keyed
/// off what the caller expects, the wire carries no response type tag beyond
/// the echoed command id.
pub trait DecodeResponse: Sized {
    fn decode(data: &[u8]) -> Result<Self>;
}

fn need(data: &[u8], len: usize) -> Result<()> {
    if data.len() < len {
        return Err(ProtoError::ShortResponse {
            got: data.len(),
            need: len,
        });
    }
    Ok(())
}

fn u32_at(data: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
}

/// Success/failure reply used by every command that has no other payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generic {
    pub error_code: u32,
}

impl DecodeResponse for Generic {
    fn decode(data: &[u8]) -> Result<Self> {
        need(data, 4)?;
        Ok(Self {
            error_code: u32_at(data, 0),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDeviceReply {
    pub device_state: u8,
    pub fpga_device_id: u32,
    pub id: [u8; 8],
}

impl DecodeResponse for QueryDeviceReply {
    fn decode(data: &[u8]) -> Result<Self> {
        need(data, 13)?;
        let mut id = [0u8; 8];
        id.copy_from_slice(&data[5..13]);
        Ok(Self {
            device_state: data[0],
            fpga_device_id: u32_at(data, 1),
            id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashStatus {
    pub error_code: u32,
    pub program_on_startup: u32,
    pub block_count: u32,
    pub bitstream_size: u32,
    pub checksum: u8,
}

impl DecodeResponse for FlashStatus {
    fn decode(data: &[u8]) -> Result<Self> {
        need(data, 17)?;
        Ok(Self {
            error_code: u32_at(data, 0),
            program_on_startup: u32_at(data, 4),
            block_count: u32_at(data, 8),
            bitstream_size: u32_at(data, 12),
            checksum: data[16],
        })
    }
}
