//! The virtual keyboard handle.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    Error, InputId,
    codec::DeviceDescriptor,
    control::{Command, ControlDevice, UINPUT_PATH, UinputControl},
    emitter,
    event::Key,
    registrar::{Registered, Registrar},
    resolver::{DEFAULT_POLL_INTERVAL, DEV_INPUT_DIR, DEVICES_LISTING_PATH, Resolver},
};

/// A builder for creating a [`Keyboard`].
///
/// Returned by [`Keyboard::builder`].
#[derive(Debug, Clone)]
pub struct Builder {
    id: InputId,
    poll_interval: Duration,
    timeout: Option<Duration>,
    uinput_path: PathBuf,
    listing_path: PathBuf,
    dev_input_dir: PathBuf,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            id: InputId::VIRTUAL_KEYBOARD,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            uinput_path: PathBuf::from(UINPUT_PATH),
            listing_path: PathBuf::from(DEVICES_LISTING_PATH),
            dev_input_dir: PathBuf::from(DEV_INPUT_DIR),
        }
    }
}

impl Builder {
    /// Configures the device's hardware IDs.
    ///
    /// Defaults to [`InputId::VIRTUAL_KEYBOARD`]. The same IDs are used to find the device in the
    /// device listing, so they should not collide with a real device that has the same name.
    pub fn with_device_id(mut self, id: InputId) -> Self {
        self.id = id;
        self
    }

    /// Sets how long to sleep between two checks for the device node. Defaults to 1 ms.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Gives up with [`Error::Timeout`] if the device node does not appear within `timeout`.
    ///
    /// By default, [`Builder::build`] waits forever.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_uinput_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.uinput_path = path.into();
        self
    }

    /// Sets the path of the device listing that is polled for the new device.
    pub fn with_devices_listing(mut self, path: impl Into<PathBuf>) -> Self {
        self.listing_path = path.into();
        self
    }

    /// Sets the directory in which `eventN` device nodes are expected.
    pub fn with_dev_input_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dev_input_dir = path.into();
        self
    }

    /// Creates the device and waits until its device node exists.
    ///
    /// `name` must be between 1 and 80 bytes long. It is checked before the control device is
    /// opened.
    pub fn build(self, name: &str) -> Result<Keyboard, Error> {
        let descriptor = DeviceDescriptor::new(name, self.id)?;
        let registrar = Registrar::open(&self.uinput_path)?;
        self.finish(registrar, descriptor)
    }

    /// Like [`Builder::build`], but registers the device on an already opened control device.
    pub fn build_with<C: ControlDevice>(self, name: &str, control: C) -> Result<Keyboard<C>, Error> {
        let descriptor = DeviceDescriptor::new(name, self.id)?;
        self.finish(Registrar::new(control), descriptor)
    }

    fn finish<C: ControlDevice>(
        self,
        registrar: Registrar<C>,
        descriptor: DeviceDescriptor,
    ) -> Result<Keyboard<C>, Error> {
        let registered = registrar.register(descriptor)?;
        let resolved = Resolver::new(registered.descriptor())
            .with_listing(&self.listing_path)
            .with_dev_dir(&self.dev_input_dir)
            .with_poll_interval(self.poll_interval)
            .with_timeout(self.timeout)
            .resolve();
        let node = match resolved {
            Ok(node) => node,
            Err(e) => {
                registered.abandon();
                return Err(e);
            }
        };

        let Registered {
            control,
            descriptor,
        } = registered;
        Ok(Keyboard {
            control: Some(control),
            descriptor,
            node,
        })
    }
}

/// A virtual keyboard backed by a `uinput` device.
///
/// The device exists from the moment [`Keyboard::create`] returns until [`Keyboard::close`] is
/// called or the [`Keyboard`] is dropped.
pub struct Keyboard<C: ControlDevice = UinputControl> {
    /// `None` once closed.
    control: Option<C>,
    descriptor: DeviceDescriptor,
    node: PathBuf,
}

impl<C: ControlDevice> fmt::Debug for Keyboard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyboard")
            .field("name", &self.name())
            .field("input_id", &self.input_id())
            .field("node", &self.node)
            .field("closed", &self.control.is_none())
            .finish()
    }
}

impl Keyboard {
    /// Creates a virtual keyboard called `name` with the default settings.
    ///
    /// Blocks until the kernel has created the device node. See [`Keyboard::builder`] to configure
    /// a timeout.
    pub fn create(name: &str) -> Result<Self, Error> {
        Builder::default().build(name)
    }

    /// Returns a [`Builder`] for configuring a new virtual keyboard.
    pub fn builder() -> Builder {
        Builder::default()
    }
}

impl<C: ControlDevice> Keyboard<C> {
    /// Presses and releases `key`, then flushes the input frame with `SYN_REPORT`.
    ///
    /// `key` must lie in `KEY_ESC..=KEY_MICMUTE` (codes 1 to 248).
    pub fn press(&mut self, key: impl Into<Key>) -> Result<(), Error> {
        let key = key.into();
        let control = self.control.as_mut().ok_or(Error::Closed)?;
        if !key.is_pressable() {
            return Err(Error::KeycodeOutOfRange(key));
        }
        emitter::press(control, key).map_err(Error::Io)
    }

    /// Destroys the device and closes the control device.
    ///
    /// The control device is closed even if destroying the device fails. Closing an already
    /// closed [`Keyboard`] returns [`Error::Closed`].
    pub fn close(&mut self) -> Result<(), Error> {
        let mut control = self.control.take().ok_or(Error::Closed)?;
        let res = control.command(Command::DevDestroy);
        drop(control);
        match res {
            Ok(()) => {
                log::debug!("destroyed uinput device '{}'", self.name());
                Ok(())
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Returns whether [`Keyboard::close`] has been called.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.control.is_none()
    }

    /// Returns the path of the evdev node (`/dev/input/eventN`) of this device.
    #[inline]
    pub fn device_node(&self) -> &Path {
        &self.node
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    #[inline]
    pub fn input_id(&self) -> InputId {
        self.descriptor.input_id()
    }
}

impl<C: ControlDevice> Drop for Keyboard<C> {
    fn drop(&mut self) {
        if let Some(mut control) = self.control.take() {
            if let Err(e) = control.command(Command::DevDestroy) {
                log::warn!("failed to destroy uinput device '{}': {e}", self.name());
            }
        }
    }
}
