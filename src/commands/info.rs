use anyhow::{Context, Result, bail};
use log::info;

use crate::cli::ConnectOpts;
use crate::device::DeviceStatus;
use crate::discover::Discovery;

pub fn run(opts: ConnectOpts) -> Result<()> {
    let mut discovery = Discovery::new();
    let uri = super::resolve_uri(&opts, &mut discovery)?;
    info!("testing device at '{uri}'");

    let device = discovery
        .query_device_or_cached(&uri, false)
        .with_context(|| format!("querying {uri}"))?;
    let Some(device) = device else {
        bail!("no response from device at {uri}");
    };

    println!("uri:          {}", device.uri);
    println!("status:       {}", device.status);
    println!("fpgaDeviceId: 0x{:08X}", device.fpga_device_id);
    println!("uid:          {}", device.uid);

    if device.status != DeviceStatus::Valid {
        bail!("programmer responded but failed to detect the FPGA");
    }
    Ok(())
}
