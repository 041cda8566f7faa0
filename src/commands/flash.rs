use anyhow::{Context, Result};
use log::info;

use crate::cli::ConnectOpts;

pub fn clear(opts: ConnectOpts) -> Result<()> {
    let (uri, mut transport) = super::connect(&opts)?;
    info!("clearing bitstream flash on '{uri}'");
    transport
        .clear_flash()
        .with_context(|| format!("clearing flash on {uri}"))?;
    info!("flash cleared");
    Ok(())
}

pub fn query(opts: ConnectOpts) -> Result<()> {
    let (uri, mut transport) = super::connect(&opts)?;
    info!("querying bitstream flash on '{uri}'");
    let status = transport
        .query_bitstream_flash()
        .with_context(|| format!("querying flash on {uri}"))?;

    println!("hasValidBitstream: {}", status.error_code == 0);
    println!("programOnStartup:  {}", status.program_on_startup);
    println!("blockCount:        {}", status.block_count);
    println!("bitstreamSize:     {}", status.bitstream_size);
    println!("checksum:          0x{:02X}", status.checksum);
    Ok(())
}
