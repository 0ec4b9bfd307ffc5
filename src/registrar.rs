//! Registration of a virtual keyboard with the `uinput` driver.

use std::{io, path::Path};

use crate::{
    Error,
    codec::DeviceDescriptor,
    control::{Command, ControlDevice, UinputControl},
    event::{EventType, Key},
};

/// Drives the setup handshake on an open control device.
///
/// The handshake is: enable `EV_KEY`, enable every key code in `0..=248`, write the
/// [`DeviceDescriptor`], then issue `UI_DEV_CREATE`. The kernel only accepts capability bits
/// before the descriptor is written.
///
/// [`Registrar`] owns the control device. If any step fails, the control device is dropped (and
/// thereby closed) before the error reaches the caller, so no half-initialized device is left
/// behind.
#[derive(Debug)]
pub struct Registrar<C: ControlDevice = UinputControl> {
    control: C,
}

impl Registrar {
    /// Opens the control device at `path` for writing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let control = UinputControl::open(path).map_err(Error::DeviceUnavailable)?;
        Ok(Self { control })
    }
}

impl<C: ControlDevice> Registrar<C> {
    /// Wraps an already opened control device.
    pub fn new(control: C) -> Self {
        Self { control }
    }

    /// Declares that the device will emit events of type `ty`.
    pub fn enable_event_class(&mut self, ty: EventType) -> io::Result<()> {
        self.control.command(Command::SetEventBit(ty))
    }

    /// Declares that the device will emit `key`.
    pub fn enable_key_bit(&mut self, key: Key) -> io::Result<()> {
        self.control.command(Command::SetKeyBit(key))
    }

    /// Registers the device described by `descriptor` and instantiates it.
    ///
    /// On success, the kernel has created the input device, but its `/dev/input/eventN` node may
    /// not exist yet; see [`Resolver`][crate::resolver::Resolver].
    pub fn register(mut self, descriptor: DeviceDescriptor) -> Result<Registered<C>, Error> {
        self.negotiate()
            .and_then(|()| self.control.write_record(&descriptor.encode()))
            .and_then(|()| self.control.command(Command::DevCreate))
            .map_err(|e| {
                log::debug!("registering '{}' failed: {e}", descriptor.name());
                Error::DeviceUnavailable(e)
            })?;

        log::debug!(
            "created uinput device '{}' ({:?})",
            descriptor.name(),
            descriptor.input_id()
        );
        Ok(Registered {
            control: self.control,
            descriptor,
        })
    }

    fn negotiate(&mut self) -> io::Result<()> {
        // `EV_SYN` is always enabled by the kernel.
        self.enable_event_class(EventType::KEY)?;
        for key in Key::all() {
            self.enable_key_bit(key)?;
        }
        Ok(())
    }
}

/// A device that has been created but not yet resolved to a device node.
#[derive(Debug)]
pub struct Registered<C: ControlDevice = UinputControl> {
    pub(crate) control: C,
    pub(crate) descriptor: DeviceDescriptor,
}

impl<C: ControlDevice> Registered<C> {
    #[inline]
    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    /// Destroys the device and closes the control device.
    ///
    /// Use this when the device will not be handed to a [`Keyboard`][crate::Keyboard], for
    /// example because its node never appeared. Failure to destroy is logged, not returned; the
    /// kernel removes the device anyway once the control device is closed.
    pub fn abandon(mut self) {
        if let Err(e) = self.control.command(Command::DevDestroy) {
            log::warn!(
                "failed to destroy abandoned device '{}': {e}",
                self.descriptor.name()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        InputId,
        codec::DESCRIPTOR_SIZE,
        test::{Op, Recorder},
    };

    use super::*;

    fn descriptor() -> DeviceDescriptor {
        DeviceDescriptor::new("test-kbd", InputId::default()).unwrap()
    }

    #[test]
    fn handshake_order() {
        let (rec, journal) = Recorder::new();
        let registered = Registrar::new(rec).register(descriptor()).unwrap();
        assert_eq!(registered.descriptor().name(), "test-kbd");

        let journal = journal.borrow();
        let ops = &journal.ops;
        assert_eq!(ops.len(), 1 + 249 + 1 + 1);
        assert_eq!(ops[0], Op::Command(Command::SetEventBit(EventType::KEY)));
        for (i, key) in Key::all().enumerate() {
            assert_eq!(ops[1 + i], Op::Command(Command::SetKeyBit(key)));
        }
        match &ops[250] {
            Op::Write(bytes) => {
                assert_eq!(bytes.len(), DESCRIPTOR_SIZE);
                assert_eq!(bytes.as_slice(), descriptor().encode().as_slice());
            }
            op => panic!("expected descriptor write, got {op:?}"),
        }
        assert_eq!(ops[251], Op::Command(Command::DevCreate));
        assert!(!journal.closed);
    }

    #[test]
    fn failure_closes_control_device() {
        // Fail during key negotiation, on the descriptor write, and on `UI_DEV_CREATE`.
        for fail_at in [0, 100, 250, 251] {
            let (rec, journal) = Recorder::failing_at(fail_at);
            let err = Registrar::new(rec).register(descriptor()).unwrap_err();
            assert!(matches!(err, Error::DeviceUnavailable(_)), "{err:?}");

            let journal = journal.borrow();
            assert!(journal.closed, "control device leaked (fail_at={fail_at})");
            assert!(!journal.commands().contains(&Command::DevCreate));
        }
    }

    #[test]
    fn abandon_destroys() {
        let (rec, journal) = Recorder::new();
        let registered = Registrar::new(rec).register(descriptor()).unwrap();
        registered.abandon();

        let journal = journal.borrow();
        assert_eq!(journal.commands().last(), Some(&Command::DevDestroy));
        assert!(journal.closed);
    }

    #[test]
    fn open_missing_control_device() {
        let err = Registrar::open("/nonexistent/uinput").unwrap_err();
        match err {
            Error::DeviceUnavailable(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            e => panic!("unexpected error {e:?}"),
        }
    }
}
