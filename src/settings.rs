//! Settings related to the probed serial port and the probe schedule.
//!
//! Use the [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
//! pattern to set the configurable values. A builder that is finalized without
//! any change reproduces the stock functional test: `/dev/Marlin` at
//! 115200-8-N-1, a 5 seconds settle delay, the four `M116` commands and a 3
//! seconds drain delay.

use std::time::Duration;

pub use serialport::{DataBits, FlowControl, Parity, StopBits};

/// Device path used when none is explicitly set.
pub const DEFAULT_PATH: &str = "/dev/Marlin";

/// Baud rate used when none is explicitly set.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Commands sent when none are explicitly set, in transmission order.
pub const DEFAULT_COMMANDS: [&str; 4] = ["M116 a", "M116 s", "M116 d", "M116 f"];

/// Time given to the board to come out of its reset after the port is opened.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(5);

/// Time given to the board to process the commands before the port is closed.
pub const DEFAULT_DRAIN: Duration = Duration::from_secs(3);

// =============================================================================
// Public Interface
// =============================================================================

/// Groups all settings related to the serial port and the probe schedule, and
/// acts as a [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
/// for the settings.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    /// The port name, usually the device path.
    pub path: String,
    /// The baud rate in symbols-per-second.
    pub baud_rate: u32,
    /// Number of bits used to represent a character sent on the line.
    pub data_bits: DataBits,
    /// The type of signalling to use for controlling data transfer.
    pub flow_control: FlowControl,
    /// The type of parity to use for error checking.
    pub parity: Parity,
    /// Number of bits to use to signal the end of a character.
    pub stop_bits: StopBits,
    /// How long a single write may block before it fails.
    pub timeout: Duration,

    /// Commands to transmit, in order, without their line terminator.
    pub commands: Vec<String>,
    /// Pause between opening the port and sending the first command.
    pub settle: Duration,
    /// Pause between sending the last command and closing the port.
    pub drain: Duration,

    /// Restrict creation of `Settings` instances unless through the
    /// `SettingsBuilder`.
    #[doc(hidden)]
    _private_use_builder: (),
}

/// The builder for the `Settings` values.
///
/// All values are optional and have default values that will be used if not
/// explicitly set.
///
/// **Example**
///
/// ```
/// use marlinprobe::SettingsBuilder;
///
/// let settings = SettingsBuilder::new().path("/dev/ttyUSB0").finalize();
/// assert_eq!(settings.baud_rate, 115_200);
/// ```
pub struct SettingsBuilder {
    settings: Settings,
}
impl SettingsBuilder {
    /// Start building the settings using default values.
    pub fn new() -> Self {
        SettingsBuilder {
            settings: Settings {
                path: DEFAULT_PATH.into(),
                baud_rate: DEFAULT_BAUD_RATE,
                data_bits: DataBits::Eight,
                flow_control: FlowControl::None,
                parity: Parity::None,
                stop_bits: StopBits::One,
                timeout: Duration::from_secs(1),
                commands: DEFAULT_COMMANDS.iter().map(|c| (*c).to_owned()).collect(),
                settle: DEFAULT_SETTLE,
                drain: DEFAULT_DRAIN,
                _private_use_builder: (),
            },
        }
    }

    /// Set the path to the serial port
    pub fn path<'a>(mut self, path: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.path = path.into().into_owned();
        self
    }

    /// Set the baud rate in symbols-per-second
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.settings.baud_rate = baud_rate;
        self
    }

    /// Set the number of bits used to represent a character sent on the line
    pub fn data_bits(mut self, data_bits: DataBits) -> Self {
        self.settings.data_bits = data_bits;
        self
    }

    /// Set the type of signalling to use for controlling data transfer
    pub fn flow_control(mut self, flow_control: FlowControl) -> Self {
        self.settings.flow_control = flow_control;
        self
    }

    /// Set the type of parity to use for error checking
    pub fn parity(mut self, parity: Parity) -> Self {
        self.settings.parity = parity;
        self
    }

    /// Set the number of bits to use to signal the end of a character
    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.settings.stop_bits = stop_bits;
        self
    }

    /// Set how long a single write may block
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Replace the command list. Commands are given bare, the carriage return
    /// is added when they are written to the port.
    pub fn commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.commands = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Set the pause before the first command
    pub fn settle(mut self, settle: Duration) -> Self {
        self.settings.settle = settle;
        self
    }

    /// Set the pause after the last command
    pub fn drain(mut self, drain: Duration) -> Self {
        self.settings.drain = drain;
        self
    }

    pub fn finalize(self) -> Settings {
        self.settings
    }
}
impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn all_default() {
    let settings = SettingsBuilder::new().finalize();
    assert_eq!(
        settings,
        Settings {
            path: "/dev/Marlin".into(),
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: Duration::from_secs(1),
            commands: vec![
                "M116 a".into(),
                "M116 s".into(),
                "M116 d".into(),
                "M116 f".into()
            ],
            settle: Duration::from_secs(5),
            drain: Duration::from_secs(3),
            _private_use_builder: (),
        }
    )
}

#[test]
fn default_matches_new() {
    assert_eq!(
        SettingsBuilder::default().finalize(),
        SettingsBuilder::new().finalize()
    );
}

#[test]
fn path() {
    let settings = SettingsBuilder::new().path("/dev/ttyUSB0").finalize();
    assert_eq!(settings.path, "/dev/ttyUSB0");
}

#[test]
fn baud_rate() {
    let baud_rate = 250_000;
    let settings = SettingsBuilder::new().baud_rate(baud_rate).finalize();
    assert_eq!(settings.baud_rate, baud_rate);
}

#[test]
fn data_bits() {
    let data_bits = DataBits::Seven;
    let settings = SettingsBuilder::new().data_bits(data_bits).finalize();
    assert_eq!(settings.data_bits, data_bits);
}

#[test]
fn flow_control() {
    let flow_control = FlowControl::Hardware;
    let settings = SettingsBuilder::new().flow_control(flow_control).finalize();
    assert_eq!(settings.flow_control, flow_control);
}

#[test]
fn stop_bits() {
    let stop_bits = StopBits::Two;
    let settings = SettingsBuilder::new().stop_bits(stop_bits).finalize();
    assert_eq!(settings.stop_bits, stop_bits);
}

#[test]
fn parity() {
    let parity = Parity::Even;
    let settings = SettingsBuilder::new().parity(parity).finalize();
    assert_eq!(settings.parity, parity);
}

#[test]
fn commands_replace_defaults() {
    let settings = SettingsBuilder::new().commands(vec!["M115"]).finalize();
    assert_eq!(settings.commands, vec!["M115".to_owned()]);
}

#[test]
fn delays() {
    let settings = SettingsBuilder::new()
        .settle(Duration::from_millis(1500))
        .drain(Duration::from_secs(0))
        .finalize();
    assert_eq!(settings.settle, Duration::from_millis(1500));
    assert_eq!(settings.drain, Duration::from_secs(0));
}
