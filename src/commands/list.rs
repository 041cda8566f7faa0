use anyhow::Result;

use crate::discover::{Discovery, TransportKind};

pub fn run() -> Result<()> {
    let mut discovery = Discovery::new();
    let devices = discovery.list_devices(None, &[TransportKind::UsbSerial])?;

    if devices.is_empty() {
        println!("no devices found");
        return Ok(());
    }
    for device in devices {
        println!(
            "{}  status={} fpgaDeviceId=0x{:08X} uid={}",
            device.uri, device.status, device.fpga_device_id, device.uid
        );
    }
    Ok(())
}
