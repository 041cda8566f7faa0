pub mod flash;
pub mod info;
pub mod list;
pub mod program;
pub mod reboot;

use anyhow::{Context, Result, bail};
use log::info;

use crate::cli::ConnectOpts;
use crate::discover::{Discovery, TransportKind};
use crate::port::SerialChannel;
use crate::transport::{Transport, USBSERIAL_SCHEME};

/// Uri for `--port`, or the first device a scan turns up.
pub fn resolve_uri(conn: &ConnectOpts, discovery: &mut Discovery) -> Result<String> {
    if let Some(port) = &conn.port {
        return Ok(format!("{USBSERIAL_SCHEME}://{port}"));
    }

    let devices = discovery.list_devices(Some(1), &[TransportKind::UsbSerial])?;
    info!(
        "found {} device{}",
        devices.len(),
        if devices.len() == 1 { "" } else { "s" }
    );
    let Some(device) = devices.into_iter().next() else {
        bail!("no device found; is the programmer attached? (use --port to select one manually)");
    };
    info!("auto-selected device '{}'", device.uri);
    Ok(device.uri)
}

pub fn connect(conn: &ConnectOpts) -> Result<(String, Transport<SerialChannel>)> {
    let mut discovery = Discovery::new();
    let uri = resolve_uri(conn, &mut discovery)?;
    let transport =
        Transport::open(&uri, conn.baud).with_context(|| format!("connecting to {uri}"))?;
    Ok((uri, transport))
}
