use serde::{Deserialize, Serialize};
use std::fmt;

const PASSCODE_SEED: u32 = 0x73E2;

/// Callsign and passcode used to authenticate with the transmission sink
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationIdentity {
    pub callsign: String,
    pub passcode: String,
}

impl StationIdentity {
    pub fn new<C: Into<String>, P: Into<String>>(callsign: C, passcode: P) -> Self {
        Self {
            callsign: callsign.into(),
            passcode: passcode.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        is_valid_station_identity(&self.callsign, &self.passcode)
    }
}

impl fmt::Debug for StationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StationIdentity")
            .field("callsign", &self.callsign)
            .field("passcode", &"<redacted>")
            .finish()
    }
}

/// Both fields must be non-empty after trimming; the callsign format is not checked
pub fn is_valid_station_identity(callsign: &str, passcode: &str) -> bool {
    !callsign.trim().is_empty() && !passcode.trim().is_empty()
}

/// Derive the numeric passcode for a callsign
///
/// This is the legacy community checksum used for autofill, not a credential.
/// The case of the callsign does not matter.
pub fn derive_passcode(callsign: &str) -> String {
    let mut hash = PASSCODE_SEED;

    for unit in callsign.to_uppercase().encode_utf16() {
        let code = u32::from(unit);
        hash ^= (code << 8) ^ code;
        let carry = if hash & 0x8000 != 0 { 0xFFFF } else { 0 };
        hash = ((hash << 1) ^ carry) & 0xFFFF;
    }

    (hash & 0x7FFF).to_string()
}
