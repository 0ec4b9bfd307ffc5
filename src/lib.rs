//! A virtual keyboard for Linux, backed by `uinput`.
//!
//! [`Keyboard::create`] registers a keyboard-class input device with the kernel and blocks until
//! its `/dev/input/eventN` node exists, so that key presses are visible to other applications
//! right away. [`Keyboard::press`] then injects a full press and release of a key, followed by a
//! `SYN_REPORT`.
//!
//! ```no_run
//! use keynput::{Keyboard, event::Key};
//!
//! let mut kbd = Keyboard::create("my-virtual-keyboard")?;
//! for key in [Key::KEY_H, Key::KEY_I, Key::KEY_ENTER] {
//!     kbd.press(key)?;
//! }
//! kbd.close()?;
//! # Ok::<_, keynput::Error>(())
//! ```
//!
//! Creating a device requires write access to `/dev/uinput`, which usually means running as root
//! or being a member of the `input` group.
//!
//! # Layers
//!
//! [`Keyboard`] is built from smaller pieces that can be used on their own:
//!
//! - [`codec`] serializes the records written to `/dev/uinput`.
//! - [`control`] abstracts the control device behind the [`ControlDevice`] trait.
//! - [`registrar`] performs the setup handshake and creates the device.
//! - [`resolver`] waits for the device node to appear.
//! - [`emitter`] writes key presses.
//!
//! [`ControlDevice`]: control::ControlDevice

#![warn(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
mod macros;


pub mod codec;
pub mod control;
pub mod emitter;
mod error;
pub mod event;
mod input_id;
mod keyboard;
mod raw;
pub mod registrar;
pub mod resolver;

pub use error::Error;
pub use event::codes::UnknownVariant;
pub use input_id::{Bus, InputId};
pub use keyboard::{Builder, Keyboard};
