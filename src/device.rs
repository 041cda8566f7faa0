use std::fmt::{self, Write};

use crate::proto::QueryDeviceReply;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Unknown,
    NoResponse,
    Valid,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceStatus::Unknown => "unknown",
            DeviceStatus::NoResponse => "noresponse",
            DeviceStatus::Valid => "ok",
        })
    }
}

/// Identity and programmability of one discovered endpoint. Immutable once
/// built; discovery caches these by uri.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub status: DeviceStatus,
    pub fpga_device_id: u32,
    pub uri: String,
    pub uid: String,
}

impl DeviceInfo {
    /// Device state 1 means the programmer sees a working FPGA; any other
    /// value is reported but not trusted.
    pub fn from_query(reply: &QueryDeviceReply, uri: &str) -> Self {
        let status = if reply.device_state == 1 {
            DeviceStatus::Valid
        } else {
            DeviceStatus::Unknown
        };
        let uid = reply.id.iter().fold(String::with_capacity(16), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        });
        Self {
            status,
            fpga_device_id: reply.fpga_device_id,
            uri: uri.to_string(),
            uid,
        }
    }
}
