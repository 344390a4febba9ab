//! Negotiated session parameters
//!
//! A [`SessionContext`] starts as the client's requested parameters, is
//! replaced wholesale by the server's negotiated values when the ACCEPT
//! packet arrives, and may be tuned by the caller between handshake
//! completion and first use.

use crate::config::ConnectionOption;
use crate::constants::{version, DEFAULT_SDU, DEFAULT_TDU};
use crate::error::Result;

/// Integrity-layer hook re-keyed when the server resets the stream.
///
/// The concrete algorithm lives in the advanced-service layer; the session
/// core only knows when to call [`HashAlgo::init`].
pub trait HashAlgo: Send {
    /// Reinitialize the algorithm state
    fn init(&mut self) -> Result<()>;
}

/// Optional advanced-service descriptor attached to the session context
#[derive(Default)]
pub struct AdvancedService {
    /// Integrity hash hook, reinitialized on MARKER reset
    pub hash_algo: Option<Box<dyn HashAlgo>>,
}

impl std::fmt::Debug for AdvancedService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvancedService")
            .field("hash_algo", &self.hash_algo.is_some())
            .finish()
    }
}

/// Parameters negotiated during the handshake
#[derive(Debug)]
pub struct SessionContext {
    /// Negotiated protocol version (requested version until ACCEPT)
    pub version: u16,
    /// Lowest protocol version the client accepts
    pub lo_version: u16,
    /// Service options word from the handshake
    pub options: u16,
    /// Maximum packet size in bytes
    pub session_data_unit: u32,
    /// Maximum transport unit in bytes
    pub transport_data_unit: u32,
    /// Set once an ACCEPT has been processed; switches the packet length
    /// field to 32 bits for version >= 315
    pub handshake_complete: bool,
    /// Negotiated TTC protocol version, set by higher layers
    pub ttc_version: u8,
    /// Server advertises end-of-streaming support
    pub has_eos_capability: bool,
    /// Server advertises fast-switching (FSAP) support
    pub has_fsap_capability: bool,
    /// Optional integrity/encryption hooks
    pub advanced_service: AdvancedService,
}

impl SessionContext {
    /// Build the requested context for a fresh connection attempt
    pub fn new(_conn_option: &ConnectionOption) -> Self {
        Self {
            version: version::DESIRED,
            lo_version: version::MINIMUM,
            options: 0,
            session_data_unit: DEFAULT_SDU,
            transport_data_unit: DEFAULT_TDU,
            handshake_complete: false,
            ttc_version: 0,
            has_eos_capability: false,
            has_fsap_capability: false,
            advanced_service: AdvancedService::default(),
        }
    }

    /// Whether packet lengths on the wire occupy 32 bits
    pub fn uses_large_length(&self) -> bool {
        self.handshake_complete && self.version >= version::MIN_LARGE_LENGTH
    }
}
