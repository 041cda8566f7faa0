use anyhow::{Context, Result};
use log::info;

use crate::cli::ConnectOpts;

pub fn run(opts: ConnectOpts) -> Result<()> {
    let (uri, mut transport) = super::connect(&opts)?;
    info!("rebooting programmer at '{uri}'");
    // no response: the usb link drops as soon as the device resets
    transport
        .reboot_programmer()
        .with_context(|| format!("rebooting {uri}"))?;
    info!("reboot command sent, link is going down");
    Ok(())
}
