//! Events for the probe state machine.
//!
//! This modules is private and restricted to the [`probe`](crate::probe)
//! scope. The public interface of the state machine is provided by
//! [`probe`](crate::probe).
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use super::state_machine::Outcome;
use crate::transport::Connection;

// =============================================================================
// Crate-Public Interface
// =============================================================================

// OpenedEvent =================================================================

/// Event fired when the connection to the device has been opened. It triggers
/// the transition to the [`SettleState`](super::states::SettleState).
#[derive(Debug)]
pub(crate) struct OpenedEvent {
    /// The open connection. Consumed and moved to the next state.
    pub connection: Box<dyn Connection>,
}

// SettledEvent ================================================================

/// Event fired once the settle delay has elapsed. It triggers the transition
/// to the [`TransmitState`](super::states::TransmitState).
#[derive(Debug)]
pub(crate) struct SettledEvent {
    /// The open connection. Consumed and moved to the next state.
    pub connection: Box<dyn Connection>,
}

// TransmittedEvent ============================================================

/// Event fired after the last command has been written. It triggers the
/// transition to the [`DrainState`](super::states::DrainState).
#[derive(Debug)]
pub(crate) struct TransmittedEvent {
    /// The open connection. Consumed and moved to the next state.
    pub connection: Box<dyn Connection>,
}

// DrainedEvent ================================================================

/// Event fired once the drain delay has elapsed. It triggers the transition to
/// the [`CloseState`](super::states::CloseState).
#[derive(Debug)]
pub(crate) struct DrainedEvent {
    /// The open connection. Consumed and moved to the next state.
    pub connection: Box<dyn Connection>,
}

// DoneEvent ===================================================================

/// Event fired when the probe run is over, whichever way it ended. It triggers
/// a transition to the `Done` state.
///
/// This event can happen:
///
///  1. at the `Init` state, when the device is not there or fails to open,
///  2. at the `Transmit` state, when a write fails,
///  3. at the `Close` state, after the connection has been released or failed
///     to be.
#[derive(Debug)]
pub(crate) struct DoneEvent {
    pub outcome: Result<Outcome, serialport::Error>,
}

// ExitEvent ===================================================================

/// The last event of the probe state machine. It stops the event loop, which
/// then hands the outcome back to the caller.
#[derive(Debug)]
pub(crate) struct ExitEvent {}

// Events enum ==================================================================

/// Events that can be triggered within the probe state machine.
///
/// Each possible value holds an `event`, which in turn may hold additional data
/// for the state transition. Such data is passed by the origin state for use by
/// the target state.
#[derive(Debug)]
pub(crate) enum Event {
    Opened(OpenedEvent),
    Settled(SettledEvent),
    Transmitted(TransmittedEvent),
    Drained(DrainedEvent),
    Done(DoneEvent),
    Exit(ExitEvent),
}
