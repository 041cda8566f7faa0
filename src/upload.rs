use log::debug;

use crate::error::Result;
use crate::frame::additive_checksum;
use crate::port::Channel;
use crate::proto::compress::compress_block;
use crate::proto::{BLOCK_SIZE, Command};
use crate::transport::Transport;

/// Shape of one upload, fixed before the first frame goes out. There is no
/// partial-resume state; a failed upload restarts from the beginning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadJob {
    pub total_size: usize,
    pub block_count: usize,
    pub save_to_flash: bool,
}

impl UploadJob {
    pub fn new(total_size: usize, save_to_flash: bool) -> Self {
        Self {
            total_size,
            block_count: total_size.div_ceil(BLOCK_SIZE),
            save_to_flash,
        }
    }
}

/// Drive the upload sequence: ProgramDevice, then every block in source
/// order, then ProgramComplete. Any nonzero device code or protocol error
/// aborts immediately, leaving the device partially programmed; the caller
/// must start over. `progress` observes (bytes sent, total bytes) after
/// each dispatched block and once more at completion.
pub fn upload<C: Channel>(
    transport: &mut Transport<C>,
    bitstream: &[u8],
    save_to_flash: bool,
    progress: &mut dyn FnMut(u64, u64),
) -> Result<()> {
    let job = UploadJob::new(bitstream.len(), save_to_flash);
    debug!(
        "upload: {} bytes in {} blocks, save_to_flash={}",
        job.total_size, job.block_count, job.save_to_flash
    );

    transport.expect_ok(&Command::ProgramDevice {
        save_to_flash: job.save_to_flash,
        total_size: job.total_size as u32,
        block_count: job.block_count as u32,
        // crc field is unused on this path, firmware ignores it
        bitstream_crc: 0,
    })?;

    let mut sent = 0u64;
    for (block_id, block) in bitstream.chunks(BLOCK_SIZE).enumerate() {
        let checksum = additive_checksum(block);
        let compressed = compress_block(block)?;
        debug!(
            "block {block_id}: {} raw -> {} compressed",
            block.len(),
            compressed.len()
        );
        transport.expect_ok(&Command::ProgramBlock {
            block_id: block_id as u16,
            compressed_size: compressed.len() as u16,
            raw_size: block.len() as u16,
            checksum,
            data: compressed,
        })?;
        sent += block.len() as u64;
        progress(sent, job.total_size as u64);
    }

    transport.expect_ok(&Command::ProgramComplete)?;
    progress(job.total_size as u64, job.total_size as u64);
    Ok(())
}
