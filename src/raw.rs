//! Kernel ABI definitions.
//!
//! These mirror the C declarations closely. They are not written to the kernel directly; the
//! [`codec`][crate::codec] derives its field offsets from them.

pub mod input;
pub mod uinput;
