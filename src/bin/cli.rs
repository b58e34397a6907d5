//! Marlinprobe command line interface.

use std::{io, process, time::Duration};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_t, App, AppSettings::*, Arg,
    ArgMatches,
};
use console::style;
use log::{debug, info, trace, LevelFilter};
use serialport::{DataBits, FlowControl, Parity, StopBits};
use simplelog::*;

use marlinprobe::{self as mp, Outcome};

fn main() {
    let matches = App::new(crate_name!())
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about(crate_description!())
        .long_about(
            "\n\
            Marlinprobe is a manual functional test for the firmware of a \
            controller board attached over a serial port. Run without any \
            argument, it:\n\
               \t* opens /dev/Marlin at 115200 baud, 8N1 \n\
               \t* waits 5 seconds for the board to reset \n\
               \t* sends `M116 a`, `M116 s`, `M116 d` and `M116 f`, each \
                   terminated by a carriage return \n\
               \t* waits 3 seconds for the board to process them \n\
               \t* closes the port \n\
            \n\
            Nothing is read back from the board and nothing is printed on \
            success. When there is no device at the given path, a single line \
            says so.\
        ",
        )
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .arg(
            Arg::with_name("DEVICE_TTY")
                .help("the tty device of the board")
                .short("t")
                .long("tty")
                .takes_value(true)
                .default_value(mp::DEFAULT_PATH)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("BAUD_RATE")
                .help("serial port baud rate")
                .short("b")
                .long("baud-rate")
                .takes_value(true)
                .default_value("115200")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("DATA_BITS")
                .help("number of bits per character")
                .short("d")
                .long("data-bits")
                .takes_value(true)
                .possible_values(&["5", "6", "7", "8"])
                .default_value("8")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("STOP_BITS")
                .help("number of stop bits per byte")
                .short("s")
                .long("stop-bits")
                .takes_value(true)
                .possible_values(&["1", "2"])
                .default_value("1")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("PARITY")
                .help("parity checking protocol")
                .short("p")
                .long("parity")
                .takes_value(true)
                .possible_values(&["none", "odd", "even"])
                .default_value("none")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("FLOW_CONTROL")
                .help("flow control mode")
                .short("f")
                .long("flow-control")
                .takes_value(true)
                .possible_values(&["none", "soft", "hard"])
                .default_value("none")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("SETTLE")
                .help("seconds to wait after opening the port")
                .long("settle")
                .takes_value(true)
                .default_value("5")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("DRAIN")
                .help("seconds to wait before closing the port")
                .long("drain")
                .takes_value(true)
                .default_value("3")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("COMMAND")
                .help("command to send instead of the default M116 ones")
                .long_help(
                    "command to send instead of the default M116 ones; repeat \
                     to send several commands, in the given order. The \
                     carriage return is added automatically.",
                )
                .short("c")
                .long("command")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .require_equals(true),
        )
        .arg(Arg::with_name("v").short("v").multiple(true).help(
            "Sets the logging level of verbosity, repeat several times for \
                higher verbosity",
        ))
        .get_matches();

    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'marlinprobe -v -v -v' or 'marlinprobe -vvv' vs 'marlinprobe -v'
    let log_level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    if let Err(e) = TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("failed to initialize logging: {}", e);
    }

    info!("marlinprobe v{}", crate_version!());
    trace!("{:#?}", matches);

    // Arguments with default values ===========================================

    // It's safe to call unwrap on all command line arguments with default
    // values, because the value with either be what the user input at runtime
    // or the default value

    let baud_rate = value_t!(matches.value_of("BAUD_RATE"), u32).unwrap_or_else(|_| {
        invalid_value(&matches, "BAUD_RATE", "baud-rate", "needs to be a numeric value")
    });

    let data_bits = match matches.value_of("DATA_BITS").unwrap() {
        "5" => DataBits::Five,
        "6" => DataBits::Six,
        "7" => DataBits::Seven,
        "8" => DataBits::Eight,
        _ => unreachable!(),
    };

    let stop_bits = match matches.value_of("STOP_BITS").unwrap() {
        "1" => StopBits::One,
        "2" => StopBits::Two,
        _ => unreachable!(),
    };

    let parity = match matches.value_of("PARITY").unwrap() {
        "none" => Parity::None,
        "even" => Parity::Even,
        "odd" => Parity::Odd,
        _ => unreachable!(),
    };

    let flow_control = match matches.value_of("FLOW_CONTROL").unwrap() {
        "none" => FlowControl::None,
        "soft" => FlowControl::Software,
        "hard" => FlowControl::Hardware,
        _ => unreachable!(),
    };

    let settle = parse_seconds(matches.value_of("SETTLE").unwrap())
        .unwrap_or_else(|| invalid_value(&matches, "SETTLE", "settle", SECONDS_EXPECTATION));

    let drain = parse_seconds(matches.value_of("DRAIN").unwrap())
        .unwrap_or_else(|| invalid_value(&matches, "DRAIN", "drain", SECONDS_EXPECTATION));

    // END - Arguments with default values =====================================

    let mut builder = mp::SettingsBuilder::default()
        .path(matches.value_of("DEVICE_TTY").unwrap())
        .baud_rate(baud_rate)
        .data_bits(data_bits)
        .stop_bits(stop_bits)
        .parity(parity)
        .flow_control(flow_control)
        .settle(settle)
        .drain(drain);

    // START - Arguments with NO default values ================================

    if let Some(commands) = matches.values_of("COMMAND") {
        let commands: Vec<&str> = commands.collect();
        if let Some(bad) = commands.iter().find(|c| !is_printable_ascii(c)) {
            invalid_command(bad);
        }
        builder = builder.commands(commands);
    }

    // END - Arguments =========================================================

    // Run the probe ===========================================================

    let settings = builder.finalize();
    debug!("{:#?}", settings);

    let prober = mp::factory(settings, mp::SerialTransport, mp::SystemClock, io::stdout());
    match prober.run() {
        Ok(Outcome::Completed) => debug!("probe completed"),
        Ok(Outcome::DeviceNotFound) => debug!("probe skipped, no device"),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

const SECONDS_EXPECTATION: &str = "needs to be a non-negative number of seconds";

/// Parse a non-negative, possibly fractional, number of seconds.
fn parse_seconds(value: &str) -> Option<Duration> {
    match value.parse::<f64>() {
        Ok(secs) if secs >= 0.0 => Duration::try_from_secs_f64(secs).ok(),
        _ => None,
    }
}

/// Commands go on the wire as single ASCII lines.
fn is_printable_ascii(command: &str) -> bool {
    command.bytes().all(|b| (0x20..0x7f).contains(&b))
}

fn invalid_value(matches: &ArgMatches, arg: &str, flag: &str, expectation: &str) -> ! {
    eprintln!(
        "{}: `{}` {}",
        style("error").red(),
        style(flag).cyan(),
        expectation
    );
    eprintln!(
        "   {} `{}` is not a valid value",
        style("-->").cyan(),
        style(matches.value_of(arg).unwrap_or_default()).on_red()
    );
    process::exit(-1);
}

fn invalid_command(command: &str) -> ! {
    eprintln!(
        "{}: `{}` needs to be printable ASCII on a single line",
        style("error").red(),
        style("command").cyan()
    );
    eprintln!(
        "   {} `{}` is not a valid value",
        style("-->").cyan(),
        style(command.escape_default()).on_red()
    );
    process::exit(-1);
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn seconds_accept_fractions() {
    assert_eq!(parse_seconds("1.5"), Some(Duration::from_millis(1500)));
    assert_eq!(parse_seconds("0"), Some(Duration::from_secs(0)));
    assert_eq!(parse_seconds("5"), Some(Duration::from_secs(5)));
}

#[test]
fn seconds_reject_out_of_range_values() {
    assert_eq!(parse_seconds("1e30"), None);
    assert_eq!(parse_seconds("-1"), None);
    assert_eq!(parse_seconds("NaN"), None);
    assert_eq!(parse_seconds("inf"), None);
    assert_eq!(parse_seconds("five"), None);
}

#[test]
fn commands_are_single_ascii_lines() {
    assert!(is_printable_ascii("M116 a"));
    assert!(!is_printable_ascii("M116\n"));
    assert!(!is_printable_ascii("M116\r"));
    assert!(!is_printable_ascii("M116 é"));
}
