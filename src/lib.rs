//! Marlinprobe is a functional smoke test for the firmware of a controller
//! board (e.g. a 3D printer board running Marlin) attached over a serial port.
//!
//! A run opens the port, waits for the board to come out of the reset that
//! opening the port triggers, writes a fixed list of commands (by default the
//! four `M116` diagnostics), waits for the board to process them and closes the
//! port. Nothing is read back from the board: the developer watches the board
//! itself to judge the result.
//!
//! The probe is implemented as a state machine in terms of **states** and
//! **transitions** between them, with the following characteristics:
//!
//! * Can only be in one state at any time.
//! * Each state can have its own associated data if needed, such as the open
//!   connection.
//! * Some data is shared between **all** states: the settings and the
//!   collaborators the probe talks to.
//! * Transitions between states are triggered via typed **events** and only
//!   explicitly defined transitions are permitted, as checked at
//!   **compile-time** through `From` implementations converting events into
//!   states.
//! * Transitioning from one state to another consumes the original state, so
//!   the connection handle is moved along and never shared.
//!
//! Everything the probe touches goes through a trait: the [`Transport`] opening
//! the [`Connection`], the [`Clock`] waiting the delays and the console
//! receiving the one diagnostic line. [`SerialTransport`] and [`SystemClock`]
//! are the real implementations.

#[macro_use]
mod macros;

mod clock;
mod probe;
mod settings;
mod transport;
mod utils;

pub use clock::{Clock, SystemClock};
pub use probe::{factory, Outcome, Prober};
pub use settings::{
    DataBits, FlowControl, Parity, Settings, SettingsBuilder, StopBits, DEFAULT_BAUD_RATE,
    DEFAULT_COMMANDS, DEFAULT_DRAIN, DEFAULT_PATH, DEFAULT_SETTLE,
};
pub use transport::{Connection, SerialTransport, Transport};
