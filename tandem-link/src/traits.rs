//! Collaborator traits at the link's seams.
//!
//! The session never talks to hardware or to the control loop directly;
//! everything it needs is injected through these traits, so the same state
//! machine runs unchanged under a DMA transport on the target and in-memory
//! mocks on the host.

use crate::fault::FaultCode;
use tandem_wire::ControlMode;

/// Outgoing byte path for encoded frames.
///
/// Fire-and-forget: the session never consults a send status, and depends on
/// nothing stronger than "arrives before or during a later tick, eventually".
/// An implementation is bound to one serial channel at construction. It may
/// hand the buffer to a DMA engine and return immediately, or block until
/// every byte is out — the two are interchangeable. The session only touches
/// scratch buffers it owns for the duration of the call, so an asynchronous
/// implementation must copy (or own) the bytes before returning.
pub trait FrameTransport {
    /// Send an encoded frame, best effort
    fn send(&mut self, buffer: &[u8]);
}

/// The control loop's face toward the link.
///
/// On the master the outbound accessors feed Control frames; on the slave
/// the setters and telemetry accessors service them. The three setpoint
/// targets are mutually exclusive — whichever mode arrived last is the one
/// the loop acts on.
pub trait ControlLink {
    /// Mode to command in the next Control frame
    fn commanded_mode(&self) -> ControlMode;

    /// Set point to command in the next Control frame
    fn commanded_set_point(&self) -> f32;

    /// Snapshot of the local fault code for outgoing frames, 0 = none
    fn local_fault(&self) -> u8;

    /// Accumulated wheel angle for Status replies
    fn position(&self) -> i32;

    /// Filtered wheel speed for Status replies
    fn speed(&self) -> i32;

    /// Apply a raw PWM target
    fn set_pwm_target(&mut self, value: f32);

    /// Apply a speed-loop setpoint
    fn set_speed_setpoint(&mut self, value: f32);

    /// Apply an angle-loop setpoint
    fn set_angle_setpoint(&mut self, value: f32);

    /// Record peer telemetry received in a Status frame
    fn record_remote(&mut self, position: i32, speed: i32);

    /// Force-clear the motor enable flag.
    ///
    /// Called whenever the peer reports a novel fault: actuation stops
    /// locally even before the local controller notices anything wrong.
    fn disable_motor(&mut self);
}

/// Process-wide fault escalation, split by fault origin
pub trait FaultReporter {
    /// Raise a fault detected on this board
    fn raise_local(&mut self, code: FaultCode);

    /// Raise a fault the peer reported about itself
    fn raise_remote(&mut self, code: u8);
}

/// Best-effort textual diagnostics for protocol anomalies.
///
/// Never load-bearing: the session behaves identically whether the sink
/// writes to a console UART or drops everything.
pub trait DiagnosticSink {
    /// Emit one line of diagnostic text
    fn emit(&mut self, text: &str);
}

/// Sink that discards all diagnostic output
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl DiagnosticSink for NullDiagnostics {
    fn emit(&mut self, _text: &str) {}
}
