//! Board-agnostic link logic for the Tandem dual-controller drive
//!
//! This crate contains everything between the wire codec ([`tandem_wire`])
//! and the hardware: the role state machine that runs the master/slave
//! exchange, the collaborator traits it is wired to (transport, control
//! loop, fault reporting, diagnostics), and the shared-state cells that
//! carry setpoints and telemetry across tasks.
//!
//! The session is single-owner: the control task calls [`LinkSession::tick`]
//! once per control cycle and [`LinkSession::handle_rx`] for each received
//! buffer, and the two never run concurrently. Everything the rest of the
//! firmware needs from the link flows through [`shared::LinkShared`] cells
//! or the injected collaborators.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod fault;
pub mod session;
pub mod shared;
pub mod traits;
pub mod transport;

pub use fault::FaultCode;
pub use session::{LinkConfig, LinkContext, LinkSession, Role};
pub use traits::{ControlLink, DiagnosticSink, FaultReporter, FrameTransport, NullDiagnostics};
