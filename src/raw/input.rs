//! `linux/input.h`

#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct input_id {
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

/// `struct timeval` as laid out on 64-bit targets.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct timeval64 {
    pub tv_sec: u64,
    pub tv_usec: u64,
}

#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct input_event {
    pub time: timeval64,
    pub type_: u16,
    pub code: u16,
    pub value: u32,
}

/// Highest key code a keyboard-class device reports (`KEY_MICMUTE`).
pub const KEY_MAX_KEYBOARD: u16 = 248;
