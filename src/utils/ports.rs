//! Serial port device manipulation.

use log::{debug, info};
use serialport::{ErrorKind, SerialPort};

use crate::Settings;

//==============================================================================
// Public Interface
//==============================================================================

/// Open the port at `settings.path` and make sure it ended up configured with
/// the requested line parameters.
///
/// Opening is attempted once. A missing device surfaces as whatever error
/// `serialport` produces for it, see [`is_missing_device`].
pub(crate) fn open_and_setup_port(
    settings: &Settings,
) -> Result<Box<dyn SerialPort>, serialport::Error> {
    debug!("Opening {}", settings.path);
    let mut port = serialport::new(&settings.path, settings.baud_rate)
        .data_bits(settings.data_bits)
        .stop_bits(settings.stop_bits)
        .parity(settings.parity)
        .flow_control(settings.flow_control)
        .timeout(settings.timeout)
        .open()?;

    // Some drivers only partially honor the builder, configure the port again
    // explicitly before reading the values back.
    port.set_baud_rate(settings.baud_rate)?;
    port.set_data_bits(settings.data_bits)?;
    port.set_stop_bits(settings.stop_bits)?;
    port.set_parity(settings.parity)?;
    port.set_flow_control(settings.flow_control)?;

    info!(
        "Connected to {} at {} baud",
        port.name().unwrap_or_else(|| settings.path.clone()),
        port.baud_rate()?
    );
    debug!("data_bits    : {:#?}", port.data_bits()?);
    debug!("stop_bits    : {:#?}", port.stop_bits()?);
    debug!("parity       : {:#?}", port.parity()?);
    debug!("flow control : {:#?}", port.flow_control()?);

    check_setting("baud rate", settings.baud_rate, port.baud_rate()?)?;
    check_setting("data bits", settings.data_bits, port.data_bits()?)?;
    check_setting("stop bits", settings.stop_bits, port.stop_bits()?)?;
    check_setting("parity", settings.parity, port.parity()?)?;

    Ok(port)
}

/// Tell whether an error returned when opening a port means that there is no
/// device behind the requested path.
///
/// Depending on the platform, `serialport` reports a path that does not exist
/// either as [`ErrorKind::NoDevice`] or as an I/O `NotFound` error.
pub(crate) fn is_missing_device(err: &serialport::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::NoDevice | ErrorKind::Io(std::io::ErrorKind::NotFound)
    )
}

//==============================================================================
// Private stuff
//==============================================================================

/// Compare a requested line parameter with the one the port reports.
fn check_setting<T>(what: &str, requested: T, actual: T) -> Result<(), serialport::Error>
where
    T: PartialEq + std::fmt::Debug,
{
    if requested == actual {
        Ok(())
    } else {
        Err(serialport::Error::new(
            ErrorKind::InvalidInput,
            format!(
                "failed to set the {} to {:?}, the port reports {:?}",
                what, requested, actual
            ),
        ))
    }
}

//==============================================================================
// Unit Tests
//==============================================================================

#[test]
fn matching_setting_is_accepted() {
    assert!(check_setting("baud rate", 115_200u32, 115_200u32).is_ok());
}

#[test]
fn mismatched_setting_is_invalid_input() {
    use serialport::Parity;

    let err = check_setting("parity", Parity::None, Parity::Even).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.to_string().contains("parity"));
}

#[test]
fn missing_device_error_kinds() {
    let no_device = serialport::Error::new(ErrorKind::NoDevice, "no such device");
    let not_found = serialport::Error::new(
        ErrorKind::Io(std::io::ErrorKind::NotFound),
        "No such file or directory",
    );
    let denied = serialport::Error::new(
        ErrorKind::Io(std::io::ErrorKind::PermissionDenied),
        "Permission denied",
    );
    assert!(is_missing_device(&no_device));
    assert!(is_missing_device(&not_found));
    assert!(!is_missing_device(&denied));
}

#[cfg(unix)]
#[test]
fn missing_device_path_is_recognized() {
    use crate::SettingsBuilder;

    let settings = SettingsBuilder::new()
        .path("/dev/this-port-does-not-exist")
        .finalize();
    match open_and_setup_port(&settings) {
        Err(err) => assert!(is_missing_device(&err), "unexpected error: {:?}", err),
        Ok(_) => panic!("opened a port that does not exist"),
    }
}
