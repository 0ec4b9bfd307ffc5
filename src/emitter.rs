//! Turning key presses into event records.

use std::io;

use crate::{
    control::ControlDevice,
    event::{InputEvent, Key, KeyState, Syn},
};

/// Returns the events that make up one press of `key`: key down, key up, and a `SYN_REPORT`
/// closing the frame.
///
/// The timestamps are left zero; the kernel stamps events on arrival.
pub fn key_press_sequence(key: Key) -> [InputEvent; 3] {
    [
        InputEvent::key(key, KeyState::PRESSED),
        InputEvent::key(key, KeyState::RELEASED),
        InputEvent::syn(Syn::REPORT),
    ]
}

/// Writes a complete press of `key` to `control`, one record per event.
///
/// Stops at the first failing write. No rollback is attempted, so a failure after the first
/// event may leave the key held down until the device is destroyed.
pub fn press<C: ControlDevice + ?Sized>(control: &mut C, key: Key) -> io::Result<()> {
    for event in key_press_sequence(key) {
        control.write_record(&event.encode())?;
    }
    log::trace!("pressed {key:?}");
    Ok(())
}
