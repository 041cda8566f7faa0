use std::collections::HashMap;

use log::{debug, info};

use crate::device::DeviceInfo;
use crate::error::Result;
use crate::port::{self, DEFAULT_BAUD};
use crate::transport::{Transport, USBSERIAL_SCHEME};

/// Ports that are never a programmer (legacy motherboard UART on Windows).
const IGNORED_PORTS: &[&str] = &["COM1"];

/// Link types discovery may scan. Only USB serial exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    UsbSerial,
}

/// Port paths most likely to be a programmer on this OS family; these get a
/// fast-timeout probe before the exhaustive scan.
fn preferred_patterns() -> &'static [&'static str] {
    if cfg!(target_os = "linux") {
        &["/dev/ttyACM*"]
    } else if cfg!(target_os = "macos") {
        &["/dev/cu.usbmodem*"]
    } else {
        &[]
    }
}

/// Minimal wildcard match: `*` matches any run of characters. The port
/// patterns need nothing more.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == text,
        Some((prefix, rest)) => {
            let Some(stripped) = text.strip_prefix(prefix) else {
                return false;
            };
            if rest.is_empty() {
                return true;
            }
            (0..=stripped.len()).any(|i| glob_match(rest, &stripped[i..]))
        }
    }
}

/// Enumeration and probing seam, so discovery logic runs against simulated
/// endpoints in tests.
pub trait Prober {
    /// Identifiers of candidate endpoints currently attached.
    fn candidates(&mut self) -> Result<Vec<String>>;
    /// Query one uri; `Timeout` means nothing answered there.
    fn probe(&mut self, uri: &str, fast: bool) -> Result<DeviceInfo>;
}

/// Real prober: serialport enumeration plus one short-lived transport per
/// probe. Channels are never shared across candidates.
pub struct SerialProber;

impl Prober for SerialProber {
    fn candidates(&mut self) -> Result<Vec<String>> {
        port::list_ports()
    }

    fn probe(&mut self, uri: &str, fast: bool) -> Result<DeviceInfo> {
        let mut transport = Transport::open(uri, DEFAULT_BAUD)?;
        if fast {
            transport.set_fast_timeouts(true)?;
        }
        transport.query_device()
    }
}

/// Finds programmer devices among the host's serial endpoints and remembers
/// what it saw. The uri cache lives as long as the service and is never
/// evicted, which is fine for a one-shot CLI process.
pub struct Discovery<P: Prober = SerialProber> {
    prober: P,
    cache: HashMap<String, DeviceInfo>,
}

impl Discovery<SerialProber> {
    pub fn new() -> Self {
        Self::with_prober(SerialProber)
    }
}

impl Default for Discovery<SerialProber> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Prober> Discovery<P> {
    pub fn with_prober(prober: P) -> Self {
        Self {
            prober,
            cache: HashMap::new(),
        }
    }

    pub fn cached(&self, uri: &str) -> Option<&DeviceInfo> {
        self.cache.get(uri)
    }

    /// Scan for devices. Probes preferred-looking ports first with the fast
    /// timeout, then sweeps every candidate at the fast and then the normal
    /// tier. Individual probe failures only mean "not this one". Returns as
    /// soon as `min_count` devices are found, if given.
    pub fn list_devices(
        &mut self,
        min_count: Option<usize>,
        kinds: &[TransportKind],
    ) -> Result<Vec<DeviceInfo>> {
        let mut uris = Vec::new();
        if kinds.contains(&TransportKind::UsbSerial) {
            for name in self.prober.candidates()? {
                if IGNORED_PORTS.contains(&name.as_str()) {
                    continue;
                }
                uris.push(format!("{USBSERIAL_SCHEME}://{name}"));
            }
        }
        debug!("discovery: {} candidate uris", uris.len());

        let mut found: Vec<DeviceInfo> = Vec::new();
        let done = |found: &Vec<DeviceInfo>| min_count.is_some_and(|n| found.len() >= n);

        // pass 1: ports that look right for this platform, probed fast
        for uri in uris.iter().filter(|uri| {
            preferred_patterns()
                .iter()
                .any(|p| glob_match(&format!("{USBSERIAL_SCHEME}://{p}"), uri.as_str()))
        }) {
            self.try_candidate(uri, true, &mut found);
            if done(&found) {
                return Ok(found);
            }
        }

        // pass 2: everything, fast tier then normal tier
        for fast in [true, false] {
            for uri in &uris {
                self.try_candidate(uri, fast, &mut found);
                if done(&found) {
                    return Ok(found);
                }
            }
        }

        Ok(found)
    }

    fn try_candidate(&mut self, uri: &str, fast: bool, found: &mut Vec<DeviceInfo>) {
        match self.query_device(uri, fast) {
            Ok(Some(info)) => {
                if !found.contains(&info) {
                    info!("found device at {uri} (uid {})", info.uid);
                    found.push(info.clone());
                }
                self.cache.insert(info.uri.clone(), info);
            }
            Ok(None) => debug!("probe {uri}: no response"),
            // soft signal during a scan, but keep the kind visible
            Err(e) => debug!("probe {uri}: {e}"),
        }
    }

    /// Query one endpoint. `None` means nothing answered within the
    /// timeout; other failures propagate.
    pub fn query_device(&mut self, uri: &str, fast: bool) -> Result<Option<DeviceInfo>> {
        debug!("query {uri} (fast={fast})");
        match self.prober.probe(uri, fast) {
            Ok(info) => Ok(Some(info)),
            Err(e) if e.is_timeout() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Like [`query_device`](Self::query_device) but satisfied from the uri
    /// cache when possible, caching any fresh answer.
    pub fn query_device_or_cached(&mut self, uri: &str, fast: bool) -> Result<Option<DeviceInfo>> {
        if let Some(info) = self.cache.get(uri) {
            return Ok(Some(info.clone()));
        }
        let info = self.query_device(uri, fast)?;
        if let Some(info) = &info {
            self.cache.insert(info.uri.clone(), info.clone());
        }
        Ok(info)
    }
}
