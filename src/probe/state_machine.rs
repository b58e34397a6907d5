//! The probe state machine.
//!
//! A probe run is a straight line: open the port, let the board settle, write
//! the commands, let the board drain them, close the port. The only branch is
//! when there is no device to open, which ends the run early with a diagnostic
//! line. Any other fault ends the run with the raw error.
//!
//! ```text
//!                  START
//!                    |
//!                    v
//!               .---------.   no device / error
//!               |  Init   |-----------------------.
//!               '---------'                       |
//!                    | opened                     |
//!                    v                            |
//!               .---------.                       |
//!               | Settle  |                       |
//!               '---------'                       |
//!                    | settled                    |
//!                    v                            |
//!               .----------.    write error       |
//!               | Transmit |-------------------.  |
//!               '----------'                   |  |
//!                    | transmitted             |  |
//!                    v                         v  v
//!               .---------.                .---------.
//!               |  Drain  |                |  Done   |---> END
//!               '---------'                '---------'
//!                    | drained                  ^
//!                    v                          |
//!               .---------.                     |
//!               |  Close  |---------------------'
//!               '---------'
//! ```

use std::io::Write;

use super::events::*;
use super::states::*;
use crate::{clock::Clock, settings::Settings, transport::Transport};

// =============================================================================
// Public Interface
// =============================================================================

/// How a probe run ended when it did not fault.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Outcome {
    /// The commands were sent and the connection was closed.
    Completed,
    /// There was no device to open. Nothing was sent.
    DeviceNotFound,
}

/// Represents the probe state machine. Use the [`factory()`] function to get
/// an instance then run it by calling its [`run()`](Prober::run) method.
pub struct Prober {
    sm: ProbeStates,
}
impl Prober {
    /// The probe event loop runs until the `Done` state is reached and its
    /// `should_exit` flag is set. At such point, the event loop terminates and
    /// returns how the run ended.
    ///
    /// Running consumes the prober: a run opens and closes the device once.
    pub fn run(self) -> Result<Outcome, serialport::Error> {
        let mut sm = self.sm;
        loop {
            sm = match sm.step() {
                ProbeStates::Done(done) if done.state.should_exit => return done.state.outcome,
                next => next,
            };
        }
    }
}

/// Factory function for the probe state machine. Use it to get an instance,
/// which you can run by invoking its `run()` method.
///
/// `console` only ever receives the line reporting a missing device.
///
/// **Example**
/// ```no_run
/// use marlinprobe::{factory, SerialTransport, SettingsBuilder, SystemClock};
///
/// let settings = SettingsBuilder::new().finalize();
/// let prober = factory(settings, SerialTransport, SystemClock, std::io::stdout());
/// let outcome = prober.run();
/// println!("{:?}", outcome);
/// ```
pub fn factory<T, C, W>(settings: Settings, transport: T, clock: C, console: W) -> Prober
where
    T: Transport + 'static,
    C: Clock + 'static,
    W: Write + 'static,
{
    let ctx = Context {
        settings,
        transport: Box::new(transport),
        clock: Box::new(clock),
        console: Box::new(console),
    };
    Prober {
        // The machine naturally starts in the `Init` state.
        sm: ProbeStates::Init(ProbeSM::new(ctx)),
    }
}

// =============================================================================
// Private stuff
// =============================================================================

/// The raw state machine implementing the probe sequence.
///
/// The generic type holds the current state while the context is shared data
/// carried over from state to state. It's also nicer when debugging to see the
/// state machine and the current state it is holding at any time.
#[derive(Debug)]
struct ProbeSM<S: Runnable> {
    ctx: Context,
    state: S,
}
impl<S: Runnable> ProbeSM<S> {
    fn run(&mut self) -> Event {
        self.state.run(&mut self.ctx)
    }

    /// Move the shared context over to the state created from `event`.
    fn transition<E, T>(self, event: E) -> ProbeSM<T>
    where
        T: Runnable + From<E>,
    {
        ProbeSM {
            ctx: self.ctx,
            state: event.into(),
        }
    }
}

/// The state machine starts in the `InitState`.
impl ProbeSM<InitState> {
    fn new(ctx: Context) -> Self {
        ProbeSM {
            ctx,
            state: InitState {},
        }
    }
}

/// An enum wrapper around the states of the probe state machine, used for
/// pattern matching during state transitions.
enum ProbeStates {
    Init(ProbeSM<InitState>),
    Settle(ProbeSM<SettleState>),
    Transmit(ProbeSM<TransmitState>),
    Drain(ProbeSM<DrainState>),
    Close(ProbeSM<CloseState>),
    Done(ProbeSM<DoneState>),
}
impl ProbeStates {
    /// The unit of work in the state machine event loop. It runs the current
    /// state and decides the next transition from the event it returns. State
    /// transitions from events are implemented using the rust `From`/`Into`
    /// pattern, so state/event mismatches are caught at compile time.
    fn step(self) -> Self {
        match self {
            ProbeStates::Init(mut sm) => {
                let event = sm.run();
                match event {
                    Event::Opened(ev) => ProbeStates::Settle(sm.transition(ev)),
                    Event::Done(ev) => ProbeStates::Done(sm.transition(ev)),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            ProbeStates::Settle(mut sm) => {
                let event = sm.run();
                match event {
                    Event::Settled(ev) => ProbeStates::Transmit(sm.transition(ev)),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            ProbeStates::Transmit(mut sm) => {
                let event = sm.run();
                match event {
                    Event::Transmitted(ev) => ProbeStates::Drain(sm.transition(ev)),
                    Event::Done(ev) => ProbeStates::Done(sm.transition(ev)),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            ProbeStates::Drain(mut sm) => {
                let event = sm.run();
                match event {
                    Event::Drained(ev) => ProbeStates::Close(sm.transition(ev)),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            ProbeStates::Close(mut sm) => {
                let event = sm.run();
                match event {
                    Event::Done(ev) => ProbeStates::Done(sm.transition(ev)),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            ProbeStates::Done(mut sm) => {
                let event = sm.run();
                match event {
                    Event::Exit(_) => {
                        sm.state.should_exit = true;
                        ProbeStates::Done(sm)
                    }
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// State from Event transitions
// -----------------------------------------------------------------------------

impl From<OpenedEvent> for SettleState {
    fn from(event: OpenedEvent) -> SettleState {
        SettleState {
            connection: Some(event.connection),
        }
    }
}

impl From<SettledEvent> for TransmitState {
    fn from(event: SettledEvent) -> TransmitState {
        TransmitState {
            connection: Some(event.connection),
        }
    }
}

impl From<TransmittedEvent> for DrainState {
    fn from(event: TransmittedEvent) -> DrainState {
        DrainState {
            connection: Some(event.connection),
        }
    }
}

impl From<DrainedEvent> for CloseState {
    fn from(event: DrainedEvent) -> CloseState {
        CloseState {
            connection: Some(event.connection),
        }
    }
}

impl From<DoneEvent> for DoneState {
    fn from(event: DoneEvent) -> DoneState {
        DoneState {
            outcome: event.outcome,
            should_exit: false,
        }
    }
}
