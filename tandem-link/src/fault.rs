//! Fault codes carried in the wire `error_code` field.
//!
//! Only the local vocabulary is enumerated. Codes reported by the peer stay
//! raw `u8` end to end — the other board may be running newer firmware with
//! codes this build does not know, and they must still propagate.

/// Local fault vocabulary, wire value in the discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FaultCode {
    /// No fault
    None = 0,
    /// Phase or DC-link over-current
    OverCurrent = 1,
    /// Battery voltage above limit
    OverVoltage = 2,
    /// Battery voltage below limit
    UnderVoltage = 3,
    /// Bridge or motor over-temperature
    OverTemperature = 4,
    /// Hall sensor implausible or missing
    HallSensor = 5,
    /// Inter-board link lost (liveness timeout)
    CommTimeout = 6,
}

impl FaultCode {
    /// Wire representation
    pub const fn as_raw(self) -> u8 {
        self as u8
    }

    /// Parse a known code; unknown values stay raw at the call site
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(FaultCode::None),
            1 => Some(FaultCode::OverCurrent),
            2 => Some(FaultCode::OverVoltage),
            3 => Some(FaultCode::UnderVoltage),
            4 => Some(FaultCode::OverTemperature),
            5 => Some(FaultCode::HallSensor),
            6 => Some(FaultCode::CommTimeout),
            _ => None,
        }
    }
}
