//! Helper functions to put the probe commands on the wire.

use hexplay::HexViewBuilder;
use log::{debug, log_enabled, Level::Debug};

/// Every command line sent to the board ends with a carriage return only.
pub(crate) const LINE_TERMINATOR: u8 = b'\r';

/// Turn a bare command into the bytes written to the port.
///
/// Any line ending already present at the end of `command` is dropped, so the
/// result always ends with exactly one [`LINE_TERMINATOR`] and never contains a
/// trailing linefeed.
pub(crate) fn frame_command(command: &str) -> Vec<u8> {
    let bare = command.trim_end_matches(&['\r', '\n'][..]);
    let mut bytes = Vec::with_capacity(bare.len() + 1);
    bytes.extend_from_slice(bare.as_bytes());
    bytes.push(LINE_TERMINATOR);
    bytes
}

/// Dump `bytes` in a hex table when debug logging is enabled.
pub(crate) fn dump_bytes(bytes: &[u8]) {
    if log_enabled!(Debug) {
        let view = HexViewBuilder::new(bytes)
            .address_offset(0)
            .row_width(16)
            .finish();
        debug!("\n{}", view);
    }
}

//==============================================================================
// Unit Tests
//==============================================================================

#[test]
fn appends_carriage_return() {
    assert_eq!(frame_command("M116 a"), b"M116 a\r".to_vec());
}

#[test]
fn replaces_existing_line_ending() {
    assert_eq!(frame_command("M116 s\r\n"), b"M116 s\r".to_vec());
    assert_eq!(frame_command("M116 d\n"), b"M116 d\r".to_vec());
    assert_eq!(frame_command("M116 f\r"), b"M116 f\r".to_vec());
}

#[test]
fn empty_command_is_a_bare_terminator() {
    assert_eq!(frame_command(""), vec![LINE_TERMINATOR]);
}
