//! States for the probe state machine.
//!
//! This modules is private and restricted to the [`probe`](crate::probe)
//! scope. The public interface of the state machine is provided by
//! [`probe`](crate::probe).
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use std::{fmt, io::Write};

use log::{debug, info, trace, warn};

use super::events::*;
use super::state_machine::Outcome;
use crate::{
    clock::Clock,
    settings::Settings,
    transport::{Connection, Transport},
    utils::{dump_bytes, frame_command, is_missing_device},
};

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Everything the states share for the whole run: the settings and the
/// collaborators the probe talks to.
pub(crate) struct Context {
    pub settings: Settings,
    pub transport: Box<dyn Transport>,
    pub clock: Box<dyn Clock>,
    /// Receives the user-facing diagnostic line.
    pub console: Box<dyn Write>,
}
impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.settings)
            .finish()
    }
}

/// Trait adding the ability for a state to be `run` after a transition into it.
pub(crate) trait Runnable {
    /// A state implements this method so it can be `run` after the state
    /// machine transitions into it.
    ///
    /// During this call, the state can do any work that needs to be done and
    /// when finished, requests a transition to a `new state` by returning the
    /// appropriate `event`. The `event` is consumed to create the `new state`
    /// using the corresponding [`From`] trait implementation (provided such
    /// implementation exists).
    fn run(&mut self, ctx: &mut Context) -> Event;
}

// Init State ==================================================================

/// The initial state, where the connection to the device gets opened.
///
///  * **[`OpenedEvent`] => [`SettleState`]** when the port opened,
///  * **[`DoneEvent`] => [`DoneState`]** when there is no device, or when
///    opening failed for any other reason.
#[derive(Debug)]
pub(crate) struct InitState {}
impl Runnable for InitState {
    fn run(&mut self, ctx: &mut Context) -> Event {
        info!("=> Open");
        match ctx.transport.open(&ctx.settings) {
            Ok(connection) => Event::Opened(OpenedEvent { connection }),
            Err(ref e) if is_missing_device(e) => {
                debug!("`{}` error: {}", ctx.settings.path, e);
                Event::Done(DoneEvent {
                    outcome: Ok(Outcome::DeviceNotFound),
                })
            }
            Err(e) => Event::Done(DoneEvent { outcome: Err(e) }),
        }
    }
}

// Settle State ================================================================

/// Waits for the board to come out of the reset that opening the port usually
/// triggers. This is a fixed delay, nothing is read from the device.
///
///  * **[`SettledEvent`] => [`TransmitState`]** once the delay has elapsed.
#[derive(Debug)]
pub(crate) struct SettleState {
    /// Consumed and moved upon the transition to [`TransmitState`].
    pub connection: Option<Box<dyn Connection>>,
}
impl Runnable for SettleState {
    fn run(&mut self, ctx: &mut Context) -> Event {
        info!("=> Settle");

        if let Some(connection) = self.connection.take() {
            debug!("Waiting {:?} for the device to settle", ctx.settings.settle);
            ctx.clock.sleep(ctx.settings.settle);
            return Event::Settled(SettledEvent { connection });
        }

        // We should never reach here!
        unreachable!()
    }
}

// Transmit State ==============================================================

/// Writes every command, in order, each framed with its line terminator. No
/// answer is expected or read.
///
///  * **[`TransmittedEvent`] => [`DrainState`]** after the last command,
///  * **[`DoneEvent`] => [`DoneState`]** as soon as a write fails. The
///    remaining commands are not sent and the connection is dropped without
///    being closed.
#[derive(Debug)]
pub(crate) struct TransmitState {
    /// Consumed and moved upon the transition to [`DrainState`].
    pub connection: Option<Box<dyn Connection>>,
}
impl Runnable for TransmitState {
    fn run(&mut self, ctx: &mut Context) -> Event {
        info!("=> Transmit");

        if let Some(mut connection) = self.connection.take() {
            for command in &ctx.settings.commands {
                let bytes = frame_command(command);
                debug!("Sending {:?}", command);
                dump_bytes(&bytes);
                if let Err(e) = connection.write(&bytes) {
                    info!("error: {:?}", e.to_string());
                    return Event::Done(DoneEvent { outcome: Err(e) });
                }
                trace!("{} bytes written to {:?}", bytes.len(), connection.name());
            }
            return Event::Transmitted(TransmittedEvent { connection });
        }

        // We should never reach here!
        unreachable!()
    }
}

// Drain State =================================================================

/// Gives the board time to process the commands before the port goes away.
///
///  * **[`DrainedEvent`] => [`CloseState`]** once the delay has elapsed.
#[derive(Debug)]
pub(crate) struct DrainState {
    /// Consumed and moved upon the transition to [`CloseState`].
    pub connection: Option<Box<dyn Connection>>,
}
impl Runnable for DrainState {
    fn run(&mut self, ctx: &mut Context) -> Event {
        info!("=> Drain");

        if let Some(connection) = self.connection.take() {
            debug!("Waiting {:?} for the device to drain", ctx.settings.drain);
            ctx.clock.sleep(ctx.settings.drain);
            return Event::Drained(DrainedEvent { connection });
        }

        // We should never reach here!
        unreachable!()
    }
}

// Close State =================================================================

/// Releases the connection.
///
///  * **[`DoneEvent`] => [`DoneState`]** always, with the close result.
#[derive(Debug)]
pub(crate) struct CloseState {
    /// Consumed when closed.
    pub connection: Option<Box<dyn Connection>>,
}
impl Runnable for CloseState {
    fn run(&mut self, _ctx: &mut Context) -> Event {
        info!("=> Close");

        if let Some(connection) = self.connection.take() {
            let outcome = connection.close().map(|_| Outcome::Completed);
            return Event::Done(DoneEvent { outcome });
        }

        // We should never reach here!
        unreachable!()
    }
}

// Done State ==================================================================

/// Reached when the probe run is over, normally or abnormally.
///
/// This state goes into a 2-phase execution. During the initial phase, it runs
/// like any other state to report how the run ended. It then triggers the
/// [`ExitEvent`] to cause the probe state machine to stop its event loop and
/// hand the `outcome` back.
#[derive(Debug)]
pub(crate) struct DoneState {
    /// How the run ended.
    pub outcome: Result<Outcome, serialport::Error>,
    /// When `true` instructs the probe state machine to exit its event loop.
    pub should_exit: bool,
}
impl Runnable for DoneState {
    fn run(&mut self, ctx: &mut Context) -> Event {
        match &self.outcome {
            Ok(Outcome::Completed) => info!("=> Done with no errors"),
            Ok(Outcome::DeviceNotFound) => {
                info!("=> Done, no device");
                let reported = writeln!(ctx.console, "No device connected at {}", ctx.settings.path)
                    .and_then(|_| ctx.console.flush());
                if let Err(e) = reported {
                    warn!("could not report the missing device: {}", e);
                }
            }
            Err(e) => info!("=> Done with errors: {}", e),
        }

        Event::Exit(ExitEvent {})
    }
}
