//! Binary encoding of the records exchanged with `/dev/uinput`.
//!
//! The kernel reads these records as raw C structs, so every field width and offset has to match
//! the ABI exactly. Rather than transmuting `#[repr(C)]` structs, records are serialized field by
//! field into fixed-size byte arrays. The offsets are derived from the kernel's ABI declarations and
//! pinned by tests.
//!
//! All integers are encoded little-endian.
//!
//! # Device descriptor (`struct uinput_user_dev`, 1116 bytes)
//!
//! | Offset | Width | Field |
//! |-------:|------:|-------|
//! | 0 | 80 | name, zero-padded |
//! | 80 | 2 | bus type |
//! | 82 | 2 | vendor |
//! | 84 | 2 | product |
//! | 86 | 2 | version |
//! | 88 | 4 | `ff_effects_max` (reserved, 0) |
//! | 92 | 1024 | `absmax`, `absmin`, `absfuzz`, `absflat` (reserved, 0) |
//!
//! # Input event (`struct input_event`, 24 bytes)
//!
//! | Offset | Width | Field |
//! |-------:|------:|-------|
//! | 0 | 8 | timestamp seconds |
//! | 8 | 8 | timestamp microseconds |
//! | 16 | 2 | event type |
//! | 18 | 2 | event code |
//! | 20 | 4 | value |

use std::{fmt, mem::offset_of};

use crate::{
    Error, InputId,
    event::{EventType, InputEvent},
    raw::{
        input::{input_event, input_id, timeval64},
        uinput::{UINPUT_MAX_NAME_SIZE, uinput_user_dev},
    },
};

/// Size of an encoded [`DeviceDescriptor`].
pub const DESCRIPTOR_SIZE: usize = size_of::<uinput_user_dev>();
/// Size of an encoded [`InputEvent`].
pub const EVENT_SIZE: usize = size_of::<input_event>();
/// Maximum length of a device name in bytes.
pub const MAX_NAME_LEN: usize = UINPUT_MAX_NAME_SIZE;

mod offset {
    use super::*;

    const ID: usize = offset_of!(uinput_user_dev, id);

    pub const NAME: usize = offset_of!(uinput_user_dev, name);
    pub const BUSTYPE: usize = ID + offset_of!(input_id, bustype);
    pub const VENDOR: usize = ID + offset_of!(input_id, vendor);
    pub const PRODUCT: usize = ID + offset_of!(input_id, product);
    pub const VERSION: usize = ID + offset_of!(input_id, version);

    const TIME: usize = offset_of!(input_event, time);

    pub const TV_SEC: usize = TIME + offset_of!(timeval64, tv_sec);
    pub const TV_USEC: usize = TIME + offset_of!(timeval64, tv_usec);
    pub const TYPE: usize = offset_of!(input_event, type_);
    pub const CODE: usize = offset_of!(input_event, code);
    pub const VALUE: usize = offset_of!(input_event, value);
}

/// The identity of a virtual device: its name and [`InputId`].
///
/// The name is stored in the same zero-padded buffer that is sent to the kernel, so a
/// [`DeviceDescriptor`] can be compared byte-for-byte against a name read back from the device
/// listing.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescriptor {
    name: [u8; MAX_NAME_LEN],
    len: usize,
    id: InputId,
}

impl DeviceDescriptor {
    /// Creates a descriptor for a device called `name`.
    ///
    /// Fails with [`Error::InvalidName`] unless `name` is between 1 and 80 bytes long.
    pub fn new(name: &str, id: InputId) -> Result<Self, Error> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > MAX_NAME_LEN {
            return Err(Error::InvalidName { len: bytes.len() });
        }

        Ok(Self {
            name: pad_name(bytes).ok_or(Error::InvalidName { len: bytes.len() })?,
            len: bytes.len(),
            id,
        })
    }

    /// Returns the device name.
    pub fn name(&self) -> &str {
        // Only ever constructed from a `&str`.
        std::str::from_utf8(&self.name[..self.len]).unwrap_or_default()
    }

    #[inline]
    pub fn input_id(&self) -> InputId {
        self.id
    }

    /// Returns whether `name` is equal to this descriptor's name once padded to the fixed-size
    /// name buffer.
    pub fn name_matches(&self, name: &[u8]) -> bool {
        pad_name(name).is_some_and(|padded| padded == self.name)
    }

    /// Serializes the descriptor into the layout of `struct uinput_user_dev`.
    ///
    /// The force-feedback and absolute axis fields are reserved and left zeroed.
    pub fn encode(&self) -> [u8; DESCRIPTOR_SIZE] {
        let mut buf = [0; DESCRIPTOR_SIZE];
        buf[offset::NAME..][..MAX_NAME_LEN].copy_from_slice(&self.name);
        put(&mut buf, offset::BUSTYPE, &self.id.bus().raw().to_le_bytes());
        put(&mut buf, offset::VENDOR, &self.id.vendor().to_le_bytes());
        put(&mut buf, offset::PRODUCT, &self.id.product().to_le_bytes());
        put(&mut buf, offset::VERSION, &self.id.version().to_le_bytes());
        buf
    }
}

impl fmt::Debug for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceDescriptor")
            .field("name", &self.name())
            .field("id", &self.id)
            .finish()
    }
}

fn pad_name(name: &[u8]) -> Option<[u8; MAX_NAME_LEN]> {
    let mut buf = [0; MAX_NAME_LEN];
    buf.get_mut(..name.len())?.copy_from_slice(name);
    Some(buf)
}

fn put(buf: &mut [u8], offset: usize, bytes: &[u8]) {
    buf[offset..][..bytes.len()].copy_from_slice(bytes);
}

fn get<const N: usize>(buf: &[u8; EVENT_SIZE], offset: usize) -> [u8; N] {
    let mut out = [0; N];
    out.copy_from_slice(&buf[offset..][..N]);
    out
}

impl InputEvent {
    /// Serializes the event into the layout of `struct input_event`.
    pub fn encode(&self) -> [u8; EVENT_SIZE] {
        let mut buf = [0; EVENT_SIZE];
        put(&mut buf, offset::TV_SEC, &self.sec.to_le_bytes());
        put(&mut buf, offset::TV_USEC, &self.usec.to_le_bytes());
        put(&mut buf, offset::TYPE, &self.type_.raw().to_le_bytes());
        put(&mut buf, offset::CODE, &self.code.to_le_bytes());
        put(&mut buf, offset::VALUE, &self.value.to_le_bytes());
        buf
    }

    /// Parses an event from the layout of `struct input_event`.
    pub fn decode(buf: &[u8; EVENT_SIZE]) -> Self {
        Self {
            sec: u64::from_le_bytes(get(buf, offset::TV_SEC)),
            usec: u64::from_le_bytes(get(buf, offset::TV_USEC)),
            type_: EventType::from_raw(u16::from_le_bytes(get(buf, offset::TYPE))),
            code: u16::from_le_bytes(get(buf, offset::CODE)),
            value: i32::from_le_bytes(get(buf, offset::VALUE)),
        }
    }
}
