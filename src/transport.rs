use std::time::Duration;

use log::{debug, trace};

use crate::device::DeviceInfo;
use crate::error::{ProtoError, Result};
use crate::frame::{read_frame, write_frame};
use crate::port::{Channel, DEFAULT_BAUD, SerialChannel};
use crate::proto::{Command, DecodeResponse, FlashStatus, Generic, QueryDeviceReply};

pub const USBSERIAL_SCHEME: &str = "usbserial";

/// Probing interval used while scanning many candidate ports.
pub const FAST_TIMEOUT: Duration = Duration::from_millis(100);
/// Interval for a link that is known to carry a device.
pub const NORMAL_TIMEOUT: Duration = Duration::from_millis(2500);

/// Split `scheme://identifier`. Only usbserial is implemented today but the
/// uri shape leaves room for other link types.
pub fn split_uri(uri: &str) -> Result<(&str, &str)> {
    uri.split_once("://")
        .filter(|(scheme, id)| !scheme.is_empty() && !id.is_empty())
        .ok_or_else(|| ProtoError::BadUri(uri.to_string()))
}

/// Sequences one command at a time over a single endpoint: flush, bump the
/// message counter, frame `[id, counter] ++ payload`, optionally read one
/// response back. Never retries; exactly one frame per call. Owns its
/// channel exclusively, which closes when the transport drops.
pub struct Transport<C: Channel> {
    channel: C,
    uri: String,
    counter: u8,
}

impl Transport<SerialChannel> {
    /// Open a serial link for a `usbserial://<port>` uri.
    pub fn open(uri: &str, baud: u32) -> Result<Self> {
        let (scheme, port) = split_uri(uri)?;
        if scheme != USBSERIAL_SCHEME {
            return Err(ProtoError::BadUri(uri.to_string()));
        }
        debug!("opening serial link {port} at {baud} baud");
        let channel = SerialChannel::open(port, baud, NORMAL_TIMEOUT)?;
        Ok(Self::new(channel, uri))
    }

    pub fn open_default(uri: &str) -> Result<Self> {
        Self::open(uri, DEFAULT_BAUD)
    }
}

impl<C: Channel> Transport<C> {
    pub fn new(channel: C, uri: impl Into<String>) -> Self {
        Self {
            channel,
            uri: uri.into(),
            counter: 0,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Switch between the probing and normal timeout tiers.
    pub fn set_fast_timeouts(&mut self, fast: bool) -> Result<()> {
        let t = if fast { FAST_TIMEOUT } else { NORMAL_TIMEOUT };
        self.channel.set_timeout(t)
    }

    fn send(&mut self, cmd: &Command) -> Result<()> {
        // drop anything stale in either direction before a fresh exchange
        self.channel.flush_input()?;
        self.channel.flush_output()?;

        self.counter = self.counter.wrapping_add(1);

        let payload = cmd.encode_payload();
        let mut packet = Vec::with_capacity(payload.len() + 2);
        packet.push(cmd.id());
        packet.push(self.counter);
        packet.extend_from_slice(&payload);
        trace!(
            "tx cmd 0x{:02X} counter {} ({} payload bytes)",
            cmd.id(),
            self.counter,
            payload.len()
        );
        write_frame(&mut self.channel, &packet)
    }

    /// Fire a command that produces no reply (reboot takes the link down).
    pub fn write_command(&mut self, cmd: &Command) -> Result<()> {
        self.send(cmd)
    }

    /// Send one command and decode the single response frame as whatever
    /// the caller expects; the wire carries no response type tag beyond the
    /// echoed `[id, counter]` prefix.
    pub fn exchange<R: DecodeResponse>(&mut self, cmd: &Command) -> Result<R> {
        self.send(cmd)?;
        let data = read_frame(&mut self.channel)?;
        if data.len() < 2 {
            return Err(ProtoError::ShortResponse {
                got: data.len(),
                need: 2,
            });
        }
        trace!("rx cmd 0x{:02X} counter {}", data[0], data[1]);
        R::decode(&data[2..])
    }

    /// Exchange for commands whose only concern is success/failure.
    pub fn expect_ok(&mut self, cmd: &Command) -> Result<()> {
        let reply: Generic = self.exchange(cmd)?;
        if reply.error_code != 0 {
            return Err(ProtoError::Device(reply.error_code));
        }
        Ok(())
    }

    /// Identify the device behind this link.
    pub fn query_device(&mut self) -> Result<DeviceInfo> {
        let reply: QueryDeviceReply = self.exchange(&Command::QueryDevice)?;
        Ok(DeviceInfo::from_query(&reply, &self.uri))
    }

    /// Erase the stored bitstream and disable programming on startup.
    pub fn clear_flash(&mut self) -> Result<()> {
        self.expect_ok(&Command::ClearBitstreamFlash)
    }

    /// Status of the bitstream stored in the programmer's flash.
    pub fn query_bitstream_flash(&mut self) -> Result<FlashStatus> {
        self.exchange(&Command::QueryBitstreamFlash)
    }

    /// Reboot the programmer. No response: the link goes down immediately.
    pub fn reboot_programmer(&mut self) -> Result<()> {
        self.write_command(&Command::RebootProgrammer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceStatus;
    use crate::frame::FRAME_MAGIC;
    use crate::port::mock::MockChannel;

    fn transport_with(ch: MockChannel) -> Transport<MockChannel> {
        Transport::new(ch, "usbserial://mock")
    }

    /// Pull `[id, counter, payload..]` packets back out of the raw tx bytes.
    fn parse_tx_packets(tx: &[u8]) -> Vec<Vec<u8>> {
        let mut packets = Vec::new();
        let mut i = 0;
        while i < tx.len() {
            assert_eq!(tx[i], FRAME_MAGIC);
            let n = u16::from_le_bytes([tx[i + 1], tx[i + 2]]) as usize;
            packets.push(tx[i + 3..i + 3 + n - 1].to_vec());
            i += 3 + n;
        }
        packets
    }

    #[test]
    fn split_uri_accepts_usbserial() {
        assert_eq!(
            split_uri("usbserial:///dev/ttyACM0").unwrap(),
            ("usbserial", "/dev/ttyACM0")
        );
        assert!(split_uri("/dev/ttyACM0").is_err());
        assert!(split_uri("usbserial://").is_err());
    }

    #[test]
    fn counter_wraps_through_all_256_values() {
        let mut t = transport_with(MockChannel::new());
        for _ in 0..256 {
            t.write_command(&Command::ProgramComplete).unwrap();
        }
        let seen: Vec<u8> = parse_tx_packets(&t.channel_mut().tx)
            .iter()
            .map(|pkt| pkt[1])
            .collect();
        // first send carries 1; value 0 appears on the 256th
        let expected: Vec<u8> = (1..=255u8).chain([0]).collect();
        assert_eq!(seen, expected);
        let mut sorted = seen;
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 256);
    }

    #[test]
    fn exchange_splits_header_and_decodes_rest() {
        let mut ch = MockChannel::new();
        ch.queue_generic(0x04, 1, 7);
        let mut t = transport_with(ch);
        let reply: Generic = t.exchange(&Command::ProgramComplete).unwrap();
        assert_eq!(reply.error_code, 7);
    }

    #[test]
    fn silent_device_is_a_timeout() {
        let mut t = transport_with(MockChannel::new());
        match t.query_device() {
            Err(ProtoError::Timeout) => {}
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn query_device_maps_reply() {
        let mut ch = MockChannel::new();
        let mut payload = vec![0x01u8, 1, 1]; // cmd echo, counter, state=1
        payload.extend_from_slice(&0x1234u32.to_le_bytes());
        payload.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        ch.queue_frame(&payload);
        let mut t = transport_with(ch);

        let info = t.query_device().unwrap();
        assert_eq!(info.status, DeviceStatus::Valid);
        assert_eq!(info.fpga_device_id, 0x1234);
        assert_eq!(info.uid, "0102030405060708");
        assert_eq!(info.uri, "usbserial://mock");
    }

    #[test]
    fn nonzero_error_code_surfaces_device_error() {
        let mut ch = MockChannel::new();
        ch.queue_generic(0x07, 1, 9);
        let mut t = transport_with(ch);
        match t.clear_flash() {
            Err(ProtoError::Device(9)) => {}
            other => panic!("expected device error 9, got {other:?}"),
        }
    }

    #[test]
    fn flushes_before_every_send() {
        let mut t = transport_with(MockChannel::new());
        t.write_command(&Command::RebootProgrammer).unwrap();
        t.write_command(&Command::RebootProgrammer).unwrap();
        assert_eq!(t.channel_mut().input_flushes, 2);
    }

    #[test]
    fn fast_timeout_tier_applies_to_channel() {
        let mut t = transport_with(MockChannel::new());
        t.set_fast_timeouts(true).unwrap();
        assert_eq!(t.channel_mut().timeout, Some(FAST_TIMEOUT));
        t.set_fast_timeouts(false).unwrap();
        assert_eq!(t.channel_mut().timeout, Some(NORMAL_TIMEOUT));
    }
}
