use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::error::Result;

pub const DEFAULT_BAUD: u32 = 115_200;

/// Duplex byte channel with a configurable read timeout. A short or empty
/// read means the timeout elapsed, not end-of-stream.
pub trait Channel {
    /// Read up to `buf.len()` bytes; returns 0 on timeout.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;
    fn flush_input(&mut self) -> Result<()>;
    fn flush_output(&mut self) -> Result<()>;
    /// One timeout covers both reads and writes on serial hardware.
    fn set_timeout(&mut self, timeout: Duration) -> Result<()>;
}

/// USB-serial byte channel. Owns the port exclusively; dropping the channel
/// closes it on every exit path.
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    pub fn open(dev: &str, baud: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(dev, baud)
            .timeout(timeout)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open()?;
        Ok(Self { port })
    }
}

impl Channel for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)
    }

    fn flush_input(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn flush_output(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::Output)?;
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.port.set_timeout(timeout)?;
        Ok(())
    }
}

/// Names of the serial ports currently attached to this host.
pub fn list_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;

    use crate::frame::FRAME_MAGIC;

    /// Scripted byte channel: `rx` holds what the fake device will send
    /// back, `tx` records everything written to it.
    #[derive(Default)]
    pub struct MockChannel {
        pub rx: VecDeque<u8>,
        pub tx: Vec<u8>,
        pub input_flushes: usize,
        pub timeout: Option<Duration>,
    }

    impl MockChannel {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue one well-formed response frame carrying `payload`.
        pub fn queue_frame(&mut self, payload: &[u8]) {
            self.rx.extend(wire_frame(payload));
        }

        /// Queue a generic response `[cmd, counter, error_code:u32le]`.
        pub fn queue_generic(&mut self, cmd: u8, counter: u8, error_code: u32) {
            let mut payload = vec![cmd, counter];
            payload.extend_from_slice(&error_code.to_le_bytes());
            self.queue_frame(&payload);
        }
    }

    /// Build a frame the way the firmware does, independent of the codec
    /// under test.
    pub fn wire_frame(payload: &[u8]) -> Vec<u8> {
        let mut out = vec![FRAME_MAGIC];
        out.extend_from_slice(&((payload.len() + 1) as u16).to_le_bytes());
        out.extend_from_slice(payload);
        out.push(payload.iter().fold(0u8, |s, &b| s.wrapping_add(b)));
        out
    }

    impl Channel for MockChannel {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let mut n = 0;
            while n < buf.len() {
                match self.rx.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }

        fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
            self.tx.extend_from_slice(data);
            Ok(())
        }

        fn flush_input(&mut self) -> Result<()> {
            // scripted responses are not stale data, so only count the call
            self.input_flushes += 1;
            Ok(())
        }

        fn flush_output(&mut self) -> Result<()> {
            Ok(())
        }

        fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
            self.timeout = Some(timeout);
            Ok(())
        }
    }
}
