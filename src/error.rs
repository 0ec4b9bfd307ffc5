use std::{io, path::PathBuf, time::Duration};

use crate::{codec::MAX_NAME_LEN, event::Key};

/// Errors returned by [`Keyboard`][crate::Keyboard] operations.
///
/// Every variant can be converted into an [`io::Error`], so callers working with [`io::Result`]
/// can use `?` directly.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The device name is empty or longer than 80 bytes.
    #[error("device name must be 1 to {max} bytes long, got {len}", max = MAX_NAME_LEN)]
    InvalidName { len: usize },

    /// The control device could not be opened, or rejected a setup command.
    #[error("uinput control device unavailable")]
    DeviceUnavailable(#[source] io::Error),

    /// The kernel's device listing could not be read or parsed.
    #[error("device listing '{}' unavailable", .path.display())]
    EnumerationUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// [`Keyboard::press`][crate::Keyboard::press] was called with a code outside
    /// `KEY_ESC..=KEY_MICMUTE`.
    #[error("key code {} out of range [{}, {}]", .0.raw(), Key::MIN.raw(), Key::MAX.raw())]
    KeycodeOutOfRange(Key),

    /// Writing an event or issuing a control command failed on a live device.
    #[error("I/O error on virtual keyboard")]
    Io(#[source] io::Error),

    /// The registered device did not show up within the configured deadline.
    #[error("device did not appear within {0:?}")]
    Timeout(Duration),

    /// The [`Keyboard`][crate::Keyboard] has already been closed.
    #[error("virtual keyboard is closed")]
    Closed,
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        let kind = match &e {
            Error::InvalidName { .. } | Error::KeycodeOutOfRange(_) => io::ErrorKind::InvalidInput,
            Error::DeviceUnavailable(cause) | Error::Io(cause) => cause.kind(),
            Error::EnumerationUnavailable { source, .. } => source.kind(),
            Error::Timeout(_) => io::ErrorKind::TimedOut,
            Error::Closed => io::ErrorKind::NotConnected,
        };
        io::Error::new(kind, e)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            Error::InvalidName { len: 81 }.to_string(),
            "device name must be 1 to 80 bytes long, got 81"
        );
        assert_eq!(
            Error::KeycodeOutOfRange(Key::from_raw(249)).to_string(),
            "key code 249 out of range [1, 248]"
        );
    }

    #[test]
    fn into_io_error() {
        let e = io::Error::from(Error::Closed);
        assert_eq!(e.kind(), io::ErrorKind::NotConnected);

        let cause = io::Error::from(io::ErrorKind::PermissionDenied);
        let e = io::Error::from(Error::DeviceUnavailable(cause));
        assert_eq!(e.kind(), io::ErrorKind::PermissionDenied);
        let inner = e.get_ref().unwrap();
        assert!(inner.source().is_some());
    }
}
