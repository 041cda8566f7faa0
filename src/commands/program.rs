use std::fs;

use anyhow::{Context, Result};
use log::info;

use crate::cli::ProgramOpts;
use crate::upload;

pub fn run(opts: ProgramOpts) -> Result<()> {
    let bitstream = fs::read(&opts.bitstream)
        .with_context(|| format!("reading bitstream '{}'", opts.bitstream.display()))?;

    let (uri, mut transport) = super::connect(&opts.connect)?;
    info!(
        "uploading '{}' ({} bytes) to {uri}, save to flash: {}",
        opts.bitstream.display(),
        bitstream.len(),
        opts.save
    );

    upload::upload(&mut transport, &bitstream, opts.save, &mut |sent, total| {
        info!("progress {sent} / {total} bytes");
    })
    .with_context(|| format!("programming device at {uri}"))?;

    info!("bitstream programmed");
    Ok(())
}
