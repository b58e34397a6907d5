//! Runs the probe against fake transport, clock and console implementations
//! and checks the exact sequence of calls they observe.

use std::{
    cell::{Cell, RefCell},
    io::{self, Write},
    rc::Rc,
    time::Duration,
};

use serialport::{DataBits, ErrorKind, FlowControl, Parity, StopBits};

use marlinprobe::{self as mp, Clock, Connection, Outcome, Settings, SettingsBuilder, Transport};

// =============================================================================
// Fakes
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Open {
        path: String,
        baud_rate: u32,
        data_bits: DataBits,
        parity: Parity,
        stop_bits: StopBits,
        flow_control: FlowControl,
    },
    Sleep(Duration),
    Write { at: Duration, bytes: Vec<u8> },
    Close { at: Duration },
}

/// Calls recorded by all the fakes, in order, and the simulated time.
#[derive(Debug, Default, Clone)]
struct Journal {
    calls: Rc<RefCell<Vec<Call>>>,
    now: Rc<Cell<Duration>>,
}
impl Journal {
    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn writes(&self) -> Vec<(Duration, Vec<u8>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Write { at, bytes } => Some((at, bytes)),
                _ => None,
            })
            .collect()
    }

    fn closes(&self) -> Vec<Duration> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Close { at } => Some(at),
                _ => None,
            })
            .collect()
    }
}

struct FakeTransport {
    journal: Journal,
    open_error: Option<ErrorKind>,
    fail_write: Option<usize>,
    fail_close: bool,
}
impl Transport for FakeTransport {
    fn open(&mut self, settings: &Settings) -> Result<Box<dyn Connection>, serialport::Error> {
        self.journal.record(Call::Open {
            path: settings.path.clone(),
            baud_rate: settings.baud_rate,
            data_bits: settings.data_bits,
            parity: settings.parity,
            stop_bits: settings.stop_bits,
            flow_control: settings.flow_control,
        });
        if let Some(kind) = self.open_error {
            return Err(serialport::Error::new(kind, "fake open failure"));
        }
        Ok(Box::new(FakeConnection {
            journal: self.journal.clone(),
            written: 0,
            fail_write: self.fail_write,
            fail_close: self.fail_close,
        }))
    }
}

#[derive(Debug)]
struct FakeConnection {
    journal: Journal,
    written: usize,
    fail_write: Option<usize>,
    fail_close: bool,
}
impl Connection for FakeConnection {
    fn write(&mut self, bytes: &[u8]) -> Result<(), serialport::Error> {
        if self.fail_write == Some(self.written) {
            return Err(serialport::Error::new(
                ErrorKind::Io(io::ErrorKind::BrokenPipe),
                "fake write failure",
            ));
        }
        self.written += 1;
        self.journal.record(Call::Write {
            at: self.journal.now.get(),
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), serialport::Error> {
        self.journal.record(Call::Close {
            at: self.journal.now.get(),
        });
        if self.fail_close {
            return Err(serialport::Error::new(
                ErrorKind::Io(io::ErrorKind::Other),
                "fake close failure",
            ));
        }
        Ok(())
    }

    fn name(&self) -> Option<String> {
        Some("fake".into())
    }
}

struct FakeClock {
    journal: Journal,
}
impl Clock for FakeClock {
    fn sleep(&mut self, duration: Duration) {
        self.journal.record(Call::Sleep(duration));
        self.journal.now.set(self.journal.now.get() + duration);
    }
}

#[derive(Debug, Default, Clone)]
struct Console(Rc<RefCell<Vec<u8>>>);
impl Console {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}
impl Write for Console {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A console whose writes always fail.
struct BrokenConsole;
impl Write for BrokenConsole {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "console closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "console closed"))
    }
}

fn fake_transport(journal: &Journal) -> FakeTransport {
    FakeTransport {
        journal: journal.clone(),
        open_error: None,
        fail_write: None,
        fail_close: false,
    }
}

/// Run the prober with `settings` over `transport`, returning what it produced
/// along with what the console received.
fn run_with(
    settings: Settings,
    transport: FakeTransport,
) -> (Result<Outcome, serialport::Error>, Console) {
    let console = Console::default();
    let clock = FakeClock {
        journal: transport.journal.clone(),
    };
    let result = mp::factory(settings, transport, clock, console.clone()).run();
    (result, console)
}

/// Run the prober with `settings`, returning what it produced along with what
/// the fakes observed.
fn run_against_fakes(
    settings: Settings,
    open_error: Option<ErrorKind>,
    fail_write: Option<usize>,
) -> (Result<Outcome, serialport::Error>, Journal, Console) {
    let journal = Journal::default();
    let transport = FakeTransport {
        open_error,
        fail_write,
        ..fake_transport(&journal)
    };
    let (result, console) = run_with(settings, transport);
    (result, journal, console)
}

fn default_open() -> Call {
    Call::Open {
        path: "/dev/Marlin".into(),
        baud_rate: 115_200,
        data_bits: DataBits::Eight,
        parity: Parity::None,
        stop_bits: StopBits::One,
        flow_control: FlowControl::None,
    }
}

// =============================================================================
// Successful run
// =============================================================================

#[test]
fn successful_run_follows_the_schedule() {
    let (result, journal, console) = run_against_fakes(SettingsBuilder::new().finalize(), None, None);

    assert_eq!(result.unwrap(), Outcome::Completed);
    let settled = Duration::from_secs(5);
    assert_eq!(
        journal.calls(),
        vec![
            default_open(),
            Call::Sleep(Duration::from_secs(5)),
            Call::Write {
                at: settled,
                bytes: b"M116 a\r".to_vec()
            },
            Call::Write {
                at: settled,
                bytes: b"M116 s\r".to_vec()
            },
            Call::Write {
                at: settled,
                bytes: b"M116 d\r".to_vec()
            },
            Call::Write {
                at: settled,
                bytes: b"M116 f\r".to_vec()
            },
            Call::Sleep(Duration::from_secs(3)),
            Call::Close {
                at: Duration::from_secs(8)
            },
        ]
    );
    assert!(console.text().is_empty());
}

#[test]
fn open_requests_115200_8n1_on_the_fixed_path() {
    let (_, journal, _) = run_against_fakes(SettingsBuilder::new().finalize(), None, None);

    let opens: Vec<Call> = journal
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::Open { .. }))
        .collect();
    assert_eq!(opens, vec![default_open()]);
}

#[test]
fn only_the_four_commands_are_written() {
    let (_, journal, _) = run_against_fakes(SettingsBuilder::new().finalize(), None, None);

    let wire: Vec<u8> = journal
        .writes()
        .into_iter()
        .flat_map(|(_, bytes)| bytes)
        .collect();
    assert_eq!(wire, b"M116 a\rM116 s\rM116 d\rM116 f\r".to_vec());
    assert!(!wire.contains(&b'\n'));
}

#[test]
fn delays_surround_the_transmission() {
    let (_, journal, _) = run_against_fakes(SettingsBuilder::new().finalize(), None, None);

    let writes = journal.writes();
    let first = writes.first().map(|(at, _)| *at).unwrap();
    let last = writes.last().map(|(at, _)| *at).unwrap();
    let closed = journal.closes()[0];

    assert!(first >= Duration::from_secs(5));
    assert!(closed - last >= Duration::from_secs(3));
}

#[test]
fn connection_is_closed_exactly_once() {
    let (_, journal, _) = run_against_fakes(SettingsBuilder::new().finalize(), None, None);
    assert_eq!(journal.closes().len(), 1);
}

#[test]
fn settings_drive_the_schedule() {
    let settings = SettingsBuilder::new()
        .path("/dev/ttyACM0")
        .baud_rate(250_000)
        .commands(vec!["M115", "M119\r\n"])
        .settle(Duration::from_millis(1500))
        .drain(Duration::from_millis(250))
        .finalize();
    let (result, journal, _) = run_against_fakes(settings, None, None);

    assert_eq!(result.unwrap(), Outcome::Completed);
    match &journal.calls()[0] {
        Call::Open {
            path, baud_rate, ..
        } => {
            assert_eq!(path, "/dev/ttyACM0");
            assert_eq!(*baud_rate, 250_000);
        }
        other => panic!("expected an open first, got {:?}", other),
    }
    assert_eq!(
        journal.writes(),
        vec![
            (Duration::from_millis(1500), b"M115\r".to_vec()),
            (Duration::from_millis(1500), b"M119\r".to_vec()),
        ]
    );
    assert_eq!(journal.closes(), vec![Duration::from_millis(1750)]);
}

// =============================================================================
// Missing device
// =============================================================================

#[test]
fn missing_device_prints_one_line_and_sends_nothing() {
    let (result, journal, console) = run_against_fakes(
        SettingsBuilder::new().finalize(),
        Some(ErrorKind::NoDevice),
        None,
    );

    assert_eq!(result.unwrap(), Outcome::DeviceNotFound);
    assert_eq!(console.text(), "No device connected at /dev/Marlin\n");
    assert_eq!(journal.calls(), vec![default_open()]);
}

#[test]
fn missing_device_path_reported_as_not_found_is_handled() {
    let (result, journal, console) = run_against_fakes(
        SettingsBuilder::new().finalize(),
        Some(ErrorKind::Io(io::ErrorKind::NotFound)),
        None,
    );

    assert_eq!(result.unwrap(), Outcome::DeviceNotFound);
    assert_eq!(console.text().lines().count(), 1);
    assert!(journal.writes().is_empty());
    assert!(journal.closes().is_empty());
}

// =============================================================================
// Unhandled faults
// =============================================================================

#[test]
fn other_open_errors_surface_raw() {
    let (result, journal, console) = run_against_fakes(
        SettingsBuilder::new().finalize(),
        Some(ErrorKind::Io(io::ErrorKind::PermissionDenied)),
        None,
    );

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io(io::ErrorKind::PermissionDenied));
    assert_eq!(err.to_string(), "fake open failure");
    assert!(console.text().is_empty());
    assert_eq!(journal.calls(), vec![default_open()]);
}

#[test]
fn write_failure_stops_the_run_without_closing() {
    let (result, journal, console) = run_against_fakes(SettingsBuilder::new().finalize(), None, Some(1));

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io(io::ErrorKind::BrokenPipe));
    assert_eq!(
        journal.calls(),
        vec![
            default_open(),
            Call::Sleep(Duration::from_secs(5)),
            Call::Write {
                at: Duration::from_secs(5),
                bytes: b"M116 a\r".to_vec()
            },
        ]
    );
    assert!(console.text().is_empty());
}

#[test]
fn close_failure_surfaces_raw() {
    let journal = Journal::default();
    let transport = FakeTransport {
        fail_close: true,
        ..fake_transport(&journal)
    };
    let (result, console) = run_with(SettingsBuilder::new().finalize(), transport);

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io(io::ErrorKind::Other));
    assert_eq!(err.to_string(), "fake close failure");
    assert_eq!(journal.closes(), vec![Duration::from_secs(8)]);
    assert_eq!(journal.writes().len(), 4);
    assert!(console.text().is_empty());
}

#[test]
fn unwritable_console_does_not_fail_the_missing_device_run() {
    let journal = Journal::default();
    let transport = FakeTransport {
        open_error: Some(ErrorKind::NoDevice),
        ..fake_transport(&journal)
    };
    let clock = FakeClock {
        journal: journal.clone(),
    };
    let result = mp::factory(
        SettingsBuilder::new().finalize(),
        transport,
        clock,
        BrokenConsole,
    )
    .run();

    assert_eq!(result.unwrap(), Outcome::DeviceNotFound);
    assert_eq!(journal.calls(), vec![default_open()]);
}
