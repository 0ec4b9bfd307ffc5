//! Access to the `uinput` control device.
//!
//! Everything the crate does to the kernel goes through two primitives: writing one binary record
//! and issuing one control command. [`ControlDevice`] captures exactly that, and
//! [`UinputControl`] implements it on top of `/dev/uinput`.

use std::{
    error::Error,
    ffi::c_int,
    fmt,
    fs::File,
    io::{self, Write as _},
    os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd},
    path::Path,
};

use uoctl::Ioctl;

use crate::{
    event::{EventType, Key},
    raw::uinput::{UI_DEV_CREATE, UI_DEV_DESTROY, UI_SET_EVBIT, UI_SET_KEYBIT},
};

/// Default path of the `uinput` control device.
pub const UINPUT_PATH: &str = "/dev/uinput";

/// A control command sent to the `uinput` driver via `ioctl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `UI_SET_EVBIT`: the device will emit events of this type.
    SetEventBit(EventType),
    /// `UI_SET_KEYBIT`: the device will emit this key code.
    SetKeyBit(Key),
    /// `UI_DEV_CREATE`: instantiate the device described by the previously written descriptor.
    DevCreate,
    /// `UI_DEV_DESTROY`: remove the device again.
    DevDestroy,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::SetEventBit(_) => "UI_SET_EVBIT",
            Command::SetKeyBit(_) => "UI_SET_KEYBIT",
            Command::DevCreate => "UI_DEV_CREATE",
            Command::DevDestroy => "UI_DEV_DESTROY",
        }
    }
}

/// A handle that accepts `uinput` records and commands.
///
/// The handle is closed when it is dropped.
pub trait ControlDevice {
    /// Writes one complete record in a single `write` call.
    fn write_record(&mut self, record: &[u8]) -> io::Result<()>;

    /// Issues a control command.
    fn command(&mut self, cmd: Command) -> io::Result<()>;
}

/// The kernel's `uinput` control device, opened write-only.
pub struct UinputControl {
    file: File,
}

impl fmt::Debug for UinputControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UinputControl")
            .field("fd", &self.file.as_raw_fd())
            .finish()
    }
}

impl AsFd for UinputControl {
    #[inline]
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for UinputControl {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl UinputControl {
    /// Opens the control device at `path` (normally [`UINPUT_PATH`]).
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::options().write(true).open(path)?;
        log::debug!("opened {}", path.display());
        Ok(Self { file })
    }

    /// Executes `ioctl` and adds context to the error.
    unsafe fn ioctl<T>(&self, name: &'static str, ioctl: Ioctl<T>, arg: T) -> io::Result<c_int> {
        unsafe { ioctl.ioctl(&self.file, arg) }.map_err(|e| with_context(name, e))
    }
}

impl ControlDevice for UinputControl {
    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        let written = (&self.file).write(record)?;
        if written != record.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write to uinput: {written} of {} bytes", record.len()),
            ));
        }
        Ok(())
    }

    fn command(&mut self, cmd: Command) -> io::Result<()> {
        let name = cmd.name();
        log::trace!("{name} {cmd:?}");
        unsafe {
            match cmd {
                Command::SetEventBit(ty) => {
                    self.ioctl(name, UI_SET_EVBIT, c_int::from(ty.raw()))?;
                }
                Command::SetKeyBit(key) => {
                    self.ioctl(name, UI_SET_KEYBIT, c_int::from(key.raw()))?;
                }
                Command::DevCreate => {
                    UI_DEV_CREATE
                        .ioctl(&self.file)
                        .map_err(|e| with_context(name, e))?;
                }
                Command::DevDestroy => {
                    UI_DEV_DESTROY
                        .ioctl(&self.file)
                        .map_err(|e| with_context(name, e))?;
                }
            }
        }
        Ok(())
    }
}

fn with_context(name: &'static str, e: io::Error) -> io::Error {
    log::trace!("ioctl {name} failed with error {e} ({:?})", e.kind());
    let msg = format!("ioctl {name} failed ({:?})", e.kind());
    io::Error::new(e.kind(), WrappedError { cause: e, msg })
}

#[derive(Debug)]
struct WrappedError {
    cause: io::Error,
    msg: String,
}

impl fmt::Display for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

impl Error for WrappedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing() {
        let err = UinputControl::open("/nonexistent/uinput").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn command_names() {
        assert_eq!(Command::SetEventBit(EventType::KEY).name(), "UI_SET_EVBIT");
        assert_eq!(Command::SetKeyBit(Key::KEY_A).name(), "UI_SET_KEYBIT");
        assert_eq!(Command::DevCreate.name(), "UI_DEV_CREATE");
        assert_eq!(Command::DevDestroy.name(), "UI_DEV_DESTROY");
    }
}
