//! Input events written to a virtual keyboard.
//!
//! An [`InputEvent`] carries:
//!
//! - **Timestamp**: Always zero when created by this crate. The kernel stamps events with the
//!   current time when the timestamp is zero.
//! - **Event Type** ([`InputEvent::event_type`]): The broad category of the event. Keyboards use
//!   [`EventType::KEY`] for key state changes and [`EventType::SYN`] to close an input frame.
//! - **Event Code** ([`InputEvent::raw_code`]): The [`Key`] or [`Syn`] code.
//! - **Event Value** ([`InputEvent::raw_value`]): The new [`KeyState`] of a key, or 0.
//!
//! The wire representation is produced by [`InputEvent::encode`].

pub(crate) mod codes;

#[cfg(any(test, feature = "serde"))]
mod serde;

use std::fmt;

pub use codes::{EventType, Key, Syn};

/// An input event sent to the kernel.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub(crate) sec: u64,
    pub(crate) usec: u64,
    pub(crate) type_: EventType,
    pub(crate) code: u16,
    pub(crate) value: i32,
}

impl InputEvent {
    /// Creates an [`InputEvent`] from raw values.
    ///
    /// The timestamp of the event will be set to 0.
    #[inline]
    pub const fn new(ty: EventType, raw_code: u16, raw_value: i32) -> Self {
        Self {
            sec: 0,
            usec: 0,
            type_: ty,
            code: raw_code,
            value: raw_value,
        }
    }

    /// Creates an `EV_KEY` event that changes the state of `key`.
    #[inline]
    pub const fn key(key: Key, state: KeyState) -> Self {
        Self::new(EventType::KEY, key.raw(), state.0)
    }

    /// Creates an `EV_SYN` event.
    #[inline]
    pub const fn syn(syn: Syn) -> Self {
        Self::new(EventType::SYN, syn.raw(), 0)
    }

    /// Returns the timestamp as `(seconds, microseconds)`.
    ///
    /// Events created by this crate carry `(0, 0)`. Events read back from an evdev node carry the
    /// time the kernel queued them.
    #[inline]
    pub fn timestamp(&self) -> (u64, u64) {
        (self.sec, self.usec)
    }

    #[inline]
    pub fn event_type(&self) -> EventType {
        self.type_
    }

    #[inline]
    pub fn raw_code(&self) -> u16 {
        self.code
    }

    #[inline]
    pub fn raw_value(&self) -> i32 {
        self.value
    }
}

impl fmt::Debug for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("InputEvent");
        if self.sec != 0 || self.usec != 0 {
            s.field("time", &format_args!("{}.{:06}", self.sec, self.usec));
        }
        match self.type_ {
            EventType::KEY => s
                .field("key", &Key::from_raw(self.code))
                .field("state", &KeyState(self.value)),
            EventType::SYN => s
                .field("syn", &Syn::from_raw(self.code))
                .field("value", &self.value),
            ty => s
                .field("type", &ty)
                .field("code", &self.code)
                .field("value", &self.value),
        };
        s.finish()
    }
}

ffi_enum! {
    /// State of a [`Key`], stored as the value of an `EV_KEY` event.
    pub enum KeyState: i32 {
        /// The key used to be pressed and has now been released.
        RELEASED = 0,
        /// The key used to be released and has now been pressed.
        PRESSED = 1,
    }
}
impl fmt::Debug for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "KeyState({:#?})", self.0),
        }
    }
}

impl KeyState {
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        let ev = InputEvent::key(Key::KEY_A, KeyState::PRESSED);
        assert_eq!(ev.event_type(), EventType::KEY);
        assert_eq!(ev.raw_code(), 30);
        assert_eq!(ev.raw_value(), 1);
        assert_eq!(ev.timestamp(), (0, 0));

        let ev = InputEvent::syn(Syn::REPORT);
        assert_eq!(ev.event_type(), EventType::SYN);
        assert_eq!(ev.raw_code(), 0);
        assert_eq!(ev.raw_value(), 0);
    }

    #[test]
    fn debug() {
        assert_eq!(
            format!("{:?}", InputEvent::key(Key::KEY_A, KeyState::RELEASED)),
            "InputEvent { key: KEY_A, state: RELEASED }"
        );
        assert_eq!(
            format!("{:?}", InputEvent::syn(Syn::REPORT)),
            "InputEvent { syn: SYN_REPORT, value: 0 }"
        );
        assert_eq!(
            format!("{:?}", InputEvent::new(EventType::from_raw(2), 1, -1)),
            "InputEvent { type: EventType(0x2), code: 1, value: -1 }"
        );
    }
}
