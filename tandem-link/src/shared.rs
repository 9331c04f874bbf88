//! Shared setpoint and telemetry mirrors.
//!
//! The link task and the real-time control loop are logically concurrent
//! producers/consumers of a handful of scalars. Each one lives in a
//! [`Shared`] cell — an embassy-sync critical-section mutex over a `Cell` —
//! so every read and write is a short atomic section and torn values cannot
//! occur, whatever the two sides' execution contexts are.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::traits::ControlLink;
use tandem_wire::ControlMode;

/// A single scalar shared between tasks
pub struct Shared<T: Copy>(Mutex<CriticalSectionRawMutex, Cell<T>>);

impl<T: Copy> Shared<T> {
    /// Create a cell; `const` so it can live in a `static`
    pub const fn new(value: T) -> Self {
        Self(Mutex::new(Cell::new(value)))
    }

    /// Read the current value
    pub fn get(&self) -> T {
        self.0.lock(|cell| cell.get())
    }

    /// Replace the value
    pub fn set(&self, value: T) {
        self.0.lock(|cell| cell.set(value));
    }
}

/// All state the link exchanges with the rest of the firmware.
///
/// Ownership per field:
/// - commanded mode/set-point: written by the application, read by the
///   master link when it builds Control frames
/// - pwm/speed/angle targets: written by the slave link, read by the
///   control loop (mutually exclusive, last writer wins)
/// - wheel position/speed: written by the control loop, read by the slave
///   link when it builds Status replies
/// - remote position/speed: written by the master link from Status frames
/// - motor enable: read by the control loop; the link force-clears it on a
///   reported peer fault
/// - local fault: written by the fault handler, snapshotted into every
///   outgoing frame
pub struct LinkShared {
    pub commanded_mode: Shared<ControlMode>,
    pub commanded_set_point: Shared<f32>,
    pub pwm_target: Shared<f32>,
    pub speed_setpoint: Shared<f32>,
    pub angle_setpoint: Shared<f32>,
    pub wheel_position: Shared<i32>,
    pub wheel_speed: Shared<i32>,
    pub remote_position: Shared<i32>,
    pub remote_speed: Shared<i32>,
    pub motor_enable: Shared<bool>,
    pub local_fault: Shared<u8>,
}

impl LinkShared {
    /// Everything zeroed, motor disabled, mode PWM
    pub const fn new() -> Self {
        Self {
            commanded_mode: Shared::new(ControlMode::Pwm),
            commanded_set_point: Shared::new(0.0),
            pwm_target: Shared::new(0.0),
            speed_setpoint: Shared::new(0.0),
            angle_setpoint: Shared::new(0.0),
            wheel_position: Shared::new(0),
            wheel_speed: Shared::new(0),
            remote_position: Shared::new(0),
            remote_speed: Shared::new(0),
            motor_enable: Shared::new(false),
            local_fault: Shared::new(0),
        }
    }
}

impl Default for LinkShared {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapter exposing a [`LinkShared`] to the session as a [`ControlLink`]
pub struct SharedControlLink<'a>(pub &'a LinkShared);

impl ControlLink for SharedControlLink<'_> {
    fn commanded_mode(&self) -> ControlMode {
        self.0.commanded_mode.get()
    }

    fn commanded_set_point(&self) -> f32 {
        self.0.commanded_set_point.get()
    }

    fn local_fault(&self) -> u8 {
        self.0.local_fault.get()
    }

    fn position(&self) -> i32 {
        self.0.wheel_position.get()
    }

    fn speed(&self) -> i32 {
        self.0.wheel_speed.get()
    }

    fn set_pwm_target(&mut self, value: f32) {
        self.0.pwm_target.set(value);
    }

    fn set_speed_setpoint(&mut self, value: f32) {
        self.0.speed_setpoint.set(value);
    }

    fn set_angle_setpoint(&mut self, value: f32) {
        self.0.angle_setpoint.set(value);
    }

    fn record_remote(&mut self, position: i32, speed: i32) {
        self.0.remote_position.set(position);
        self.0.remote_speed.set(speed);
    }

    fn disable_motor(&mut self) {
        self.0.motor_enable.set(false);
    }
}
