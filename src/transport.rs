//! The seam between the probe and the device it talks to.
//!
//! The probe state machine only ever sees a [`Transport`] able to open a
//! [`Connection`], and a connection able to write bytes and be closed. The
//! production implementation is [`SerialTransport`], which opens a real serial
//! port through the `serialport` crate. Tests substitute their own
//! implementations to observe the exact sequence of calls without hardware.

use std::{fmt, io::Write};

use log::debug;
use serialport::SerialPort;

use crate::{settings::Settings, utils::open_and_setup_port};

// =============================================================================
// Public Interface
// =============================================================================

/// Something that can open a connection to the probed device.
pub trait Transport {
    /// Open a connection using the path and line parameters in `settings`.
    ///
    /// A missing device must be reported with an error of kind
    /// [`serialport::ErrorKind::NoDevice`]; any other kind is treated as a
    /// fatal fault by the probe.
    fn open(&mut self, settings: &Settings) -> Result<Box<dyn Connection>, serialport::Error>;
}

/// An open, exclusively owned connection to the probed device.
pub trait Connection: fmt::Debug {
    /// Write all of `bytes` to the device, blocking until done.
    fn write(&mut self, bytes: &[u8]) -> Result<(), serialport::Error>;

    /// Release the connection. Consumes it, so it can only happen once.
    fn close(self: Box<Self>) -> Result<(), serialport::Error>;

    /// A name for the connection used in diagnostics, usually the device path.
    fn name(&self) -> Option<String>;
}

/// Opens real serial ports.
#[derive(Debug, Default, Copy, Clone)]
pub struct SerialTransport;
impl Transport for SerialTransport {
    fn open(&mut self, settings: &Settings) -> Result<Box<dyn Connection>, serialport::Error> {
        let port = open_and_setup_port(settings)?;
        Ok(Box::new(SerialConnection { port }))
    }
}

// =============================================================================
// Private stuff
// =============================================================================

struct SerialConnection {
    port: Box<dyn SerialPort>,
}
impl Connection for SerialConnection {
    fn write(&mut self, bytes: &[u8]) -> Result<(), serialport::Error> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<(), serialport::Error> {
        self.port.flush()?;
        debug!("Closing {}", self.port.name().unwrap_or_default());
        // The port handle is released when dropped.
        Ok(())
    }

    fn name(&self) -> Option<String> {
        self.port.name()
    }
}
impl fmt::Debug for SerialConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let port = &self.port;
        debug_fmt_serialport!(port, f).finish()
    }
}
