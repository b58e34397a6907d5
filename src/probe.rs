//! Device prober: the open, settle, transmit, drain and close sequence run
//! against the board.
//!
//! **Example** - Executing the state machine event loop against a real port:
//! ```no_run
//! use marlinprobe::{self as mp, Outcome};
//!
//! let settings = mp::SettingsBuilder::new().path("/dev/ttyACM0").finalize();
//! let prober = mp::factory(settings, mp::SerialTransport, mp::SystemClock, std::io::stdout());
//! match prober.run() {
//!     Ok(Outcome::Completed) => {}
//!     Ok(Outcome::DeviceNotFound) => {}
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

mod events;
mod state_machine;
mod states;

pub use state_machine::{factory, Outcome, Prober};
