//! Helper functions to deal with serial ports and the probe commands.

mod commands;
mod ports;

pub(crate) use commands::{dump_bytes, frame_command};
pub(crate) use ports::{is_missing_device, open_and_setup_port};
