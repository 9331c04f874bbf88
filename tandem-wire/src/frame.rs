//! Frame shapes, classification, and decoding.
//!
//! Multi-byte payload fields are little-endian; the trailing CRC is stored
//! high byte first, as the bit-serial CRC produces it. The CRC covers every
//! byte of the frame before the CRC field itself.

use crate::crc::crc16;
use heapless::Vec;

/// First byte of a Control frame
pub const CONTROL_MAGIC: u8 = 0xCD;

/// First byte of a Status frame
pub const STATUS_MAGIC: u8 = 0xDC;

/// Control frame size on the wire
pub const CONTROL_FRAME_LEN: usize = 10;

/// Status frame size on the wire
pub const STATUS_FRAME_LEN: usize = 13;

/// Largest frame either side ever sends
pub const MAX_FRAME_LEN: usize = STATUS_FRAME_LEN;

/// Width of the trailing CRC field
const CRC_LEN: usize = 2;

/// Which control-loop target a Control frame addresses
///
/// The three targets are mutually exclusive; the most recently commanded
/// mode wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlMode {
    /// Raw PWM duty target, open loop
    Pwm,
    /// Speed-loop setpoint
    Speed,
    /// Angle-loop setpoint
    Angle,
}

// Wire format values
const MODE_PWM: u8 = 0x00;
const MODE_SPEED: u8 = 0x01;
const MODE_ANGLE: u8 = 0x02;

impl ControlMode {
    /// Parse a mode from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            MODE_PWM => Some(ControlMode::Pwm),
            MODE_SPEED => Some(ControlMode::Speed),
            MODE_ANGLE => Some(ControlMode::Angle),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            ControlMode::Pwm => MODE_PWM,
            ControlMode::Speed => MODE_SPEED,
            ControlMode::Angle => MODE_ANGLE,
        }
    }
}

/// Frame kind recovered from a buffer's first byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameKind {
    Control,
    Status,
}

impl FrameKind {
    /// Exact on-wire size of this frame kind
    pub const fn frame_len(self) -> usize {
        match self {
            FrameKind::Control => CONTROL_FRAME_LEN,
            FrameKind::Status => STATUS_FRAME_LEN,
        }
    }

    /// Classify a received buffer by magic byte and exact length.
    ///
    /// Returns `None` for anything not framed for this protocol: an unknown
    /// first byte, or a known magic with the wrong buffer size. Callers may
    /// hand such buffers to other consumers of the channel.
    pub fn classify(buf: &[u8]) -> Option<Self> {
        let kind = match *buf.first()? {
            CONTROL_MAGIC => FrameKind::Control,
            STATUS_MAGIC => FrameKind::Status,
            _ => return None,
        };
        (buf.len() == kind.frame_len()).then_some(kind)
    }
}

/// Errors from [`decode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Unknown magic byte, or wrong buffer size for the apparent kind.
    /// Expected noise on a shared channel; dropped without diagnostics.
    Framing,
    /// CRC-valid Control frame with a mode byte outside the enumeration
    UnknownMode(u8),
    /// Well-framed but the recomputed CRC disagrees with the received one
    Crc {
        kind: FrameKind,
        computed: u16,
        received: u16,
    },
}

/// Setpoint command, sent master -> slave
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlFrame {
    /// Master-assigned sequence number, wraps at 255
    pub seq: u8,
    /// Which target the set point addresses
    pub mode: ControlMode,
    /// Target value in the unit of the selected mode
    pub set_point: f32,
    /// Sender's current fault code, 0 = none
    pub error_code: u8,
}

impl ControlFrame {
    /// Encode into the fixed wire layout, CRC included
    pub fn encode(&self) -> [u8; CONTROL_FRAME_LEN] {
        let mut buf = [0u8; CONTROL_FRAME_LEN];
        buf[0] = CONTROL_MAGIC;
        buf[1] = self.seq;
        buf[2] = self.mode.to_byte();
        buf[3..7].copy_from_slice(&self.set_point.to_le_bytes());
        buf[7] = self.error_code;
        let crc = crc16(&buf[..CONTROL_FRAME_LEN - CRC_LEN]);
        buf[8..10].copy_from_slice(&crc.to_be_bytes());
        buf
    }
}

/// Telemetry reply, sent slave -> master
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFrame {
    /// Echo of the Control frame this answers
    pub seq: u8,
    /// Accumulated wheel angle
    pub position: i32,
    /// Filtered wheel speed
    pub speed: i32,
    /// Sender's current fault code, 0 = none
    pub error_code: u8,
}

impl StatusFrame {
    /// Encode into the fixed wire layout, CRC included
    pub fn encode(&self) -> [u8; STATUS_FRAME_LEN] {
        let mut buf = [0u8; STATUS_FRAME_LEN];
        buf[0] = STATUS_MAGIC;
        buf[1] = self.seq;
        buf[2..6].copy_from_slice(&self.position.to_le_bytes());
        buf[6..10].copy_from_slice(&self.speed.to_le_bytes());
        buf[10] = self.error_code;
        let crc = crc16(&buf[..STATUS_FRAME_LEN - CRC_LEN]);
        buf[11..13].copy_from_slice(&crc.to_be_bytes());
        buf
    }
}

/// A decoded frame of either kind
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Frame {
    Control(ControlFrame),
    Status(StatusFrame),
}

impl Frame {
    /// Fault code common to both kinds
    pub fn error_code(&self) -> u8 {
        match self {
            Frame::Control(c) => c.error_code,
            Frame::Status(s) => s.error_code,
        }
    }

    /// Encode either kind into a size-erased buffer
    pub fn encode(&self) -> Vec<u8, MAX_FRAME_LEN> {
        let mut out = Vec::new();
        // Both arrays fit MAX_FRAME_LEN, extend cannot fail
        match self {
            Frame::Control(c) => {
                let _ = out.extend_from_slice(&c.encode());
            }
            Frame::Status(s) => {
                let _ = out.extend_from_slice(&s.encode());
            }
        }
        out
    }
}

/// Classify and decode a received buffer.
///
/// Validation order follows the trust ladder: framing first (magic + exact
/// size), then CRC over everything before the CRC field, then field-level
/// checks. A frame is never inspected further once a lower rung fails.
pub fn decode(buf: &[u8]) -> Result<Frame, DecodeError> {
    let kind = FrameKind::classify(buf).ok_or(DecodeError::Framing)?;

    let split = buf.len() - CRC_LEN;
    let computed = crc16(&buf[..split]);
    let received = u16::from_be_bytes([buf[split], buf[split + 1]]);
    if computed != received {
        return Err(DecodeError::Crc {
            kind,
            computed,
            received,
        });
    }

    match kind {
        FrameKind::Control => {
            let mode = ControlMode::from_byte(buf[2]).ok_or(DecodeError::UnknownMode(buf[2]))?;
            let mut sp = [0u8; 4];
            sp.copy_from_slice(&buf[3..7]);
            Ok(Frame::Control(ControlFrame {
                seq: buf[1],
                mode,
                set_point: f32::from_le_bytes(sp),
                error_code: buf[7],
            }))
        }
        FrameKind::Status => {
            let mut pos = [0u8; 4];
            pos.copy_from_slice(&buf[2..6]);
            let mut speed = [0u8; 4];
            speed.copy_from_slice(&buf[6..10]);
            Ok(Frame::Status(StatusFrame {
                seq: buf[1],
                position: i32::from_le_bytes(pos),
                speed: i32::from_le_bytes(speed),
                error_code: buf[10],
            }))
        }
    }
}
