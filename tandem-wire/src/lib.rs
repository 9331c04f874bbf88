//! Inter-board wire protocol for the Tandem dual-controller link
//!
//! This crate defines the binary protocol spoken over the half-duplex UART
//! between the master and slave motor-controller boards. Two fixed-size
//! message shapes exist, discriminated by their first byte:
//!
//! ```text
//! Control (master -> slave, 10 bytes)
//! ┌───────┬─────┬──────┬───────────────┬───────┬──────────┐
//! │ MAGIC │ SEQ │ MODE │ SET_POINT f32 │ ERROR │ CRC16 BE │
//! │ 1B    │ 1B  │ 1B   │ 4B LE         │ 1B    │ 2B       │
//! └───────┴─────┴──────┴───────────────┴───────┴──────────┘
//!
//! Status (slave -> master, 13 bytes)
//! ┌───────┬─────┬──────────────┬───────────┬───────┬──────────┐
//! │ MAGIC │ SEQ │ POSITION i32 │ SPEED i32 │ ERROR │ CRC16 BE │
//! │ 1B    │ 1B  │ 4B LE        │ 4B LE     │ 1B    │ 2B       │
//! └───────┴─────┴──────────────┴───────────┴───────┴──────────┘
//! ```
//!
//! There is no length field and no byte stuffing: the magic byte implies the
//! exact frame size, so a buffer of any other size is simply not a frame of
//! this protocol. That keeps the link usable on a channel shared with other
//! framings (the debug console) — unrecognized buffers fall through to the
//! next consumer instead of being errors.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod crc;
pub mod frame;

pub use crc::crc16;
pub use frame::{
    decode, ControlFrame, ControlMode, DecodeError, Frame, FrameKind, StatusFrame,
    CONTROL_FRAME_LEN, CONTROL_MAGIC, MAX_FRAME_LEN, STATUS_FRAME_LEN, STATUS_MAGIC,
};
