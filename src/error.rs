use thiserror::Error;

/// Protocol-level outcomes the callers care about individually: discovery
/// treats `Timeout` as "no device here" and keeps scanning, programming
/// treats everything as a hard abort.
#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("no response within the active timeout")]
    Timeout,

    #[error("bad frame magic 0x{0:02X}, stream desynchronized")]
    BadMagic(u8),

    #[error("frame checksum mismatch: computed 0x{computed:02X}, received 0x{received:02X}")]
    Checksum { computed: u8, received: u8 },

    #[error("device reported error code {0}")]
    Device(u32),

    #[error("payload of {0} bytes exceeds the single-frame limit")]
    Oversized(usize),

    #[error("response too short: got {got} bytes, need {need}")]
    ShortResponse { got: usize, need: usize },

    #[error("unsupported transport uri '{0}'")]
    BadUri(String),

    #[error("serial: {0}")]
    Serial(#[from] serialport::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProtoError>;

impl ProtoError {
    /// Soft failure: the endpoint simply did not answer in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProtoError::Timeout)
    }
}
