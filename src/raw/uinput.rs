//! `linux/uinput.h`.

use std::ffi::c_int;

use uoctl::{_IO, _IOW, Ioctl};

use super::input::input_id;

pub const UINPUT_MAX_NAME_SIZE: usize = 80;
pub const ABS_CNT: usize = 0x40;

/// The legacy device setup record, written to `/dev/uinput` before `UI_DEV_CREATE`.
#[repr(C)]
pub struct uinput_user_dev {
    pub name: [u8; UINPUT_MAX_NAME_SIZE],
    pub id: input_id,
    pub ff_effects_max: u32,
    pub absmax: [i32; ABS_CNT],
    pub absmin: [i32; ABS_CNT],
    pub absfuzz: [i32; ABS_CNT],
    pub absflat: [i32; ABS_CNT],
}

pub const UINPUT_IOCTL_BASE: u8 = b'U';
pub const UI_DEV_CREATE: Ioctl = _IO(UINPUT_IOCTL_BASE, 1);
pub const UI_DEV_DESTROY: Ioctl = _IO(UINPUT_IOCTL_BASE, 2);

pub const UI_SET_EVBIT: Ioctl<c_int> = _IOW(UINPUT_IOCTL_BASE, 100).with_direct_arg();
pub const UI_SET_KEYBIT: Ioctl<c_int> = _IOW(UINPUT_IOCTL_BASE, 101).with_direct_arg();
