use std::fmt::{self, LowerHex};

use crate::raw::input::input_id;

/// Input device ID: the bus, vendor, product and version tuple of a device.
///
/// The tuple is sent to the kernel at registration and read back from the device listing to find
/// the registered device again, so it should be distinctive.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct InputId(pub(crate) input_id);

impl InputId {
    /// The ID virtual keyboards are registered with unless configured otherwise.
    pub const VIRTUAL_KEYBOARD: Self = Self::new(Bus::USB, 0x4711, 0x0815, 1);

    /// Creates an [`InputId`] from its components.
    #[inline]
    pub const fn new(bus: Bus, vendor: u16, product: u16, version: u16) -> Self {
        Self(input_id {
            bustype: bus.0,
            vendor,
            product,
            version,
        })
    }

    /// Returns the bus type this device claims to be attached with.
    #[inline]
    pub fn bus(&self) -> Bus {
        Bus(self.0.bustype)
    }

    /// Returns the vendor ID.
    #[inline]
    pub fn vendor(&self) -> u16 {
        self.0.vendor
    }

    /// Returns the product ID.
    #[inline]
    pub fn product(&self) -> u16 {
        self.0.product
    }

    /// The device or transport version.
    #[inline]
    pub fn version(&self) -> u16 {
        self.0.version
    }
}

impl fmt::Debug for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Hex<T: LowerHex>(T);
        impl<T: LowerHex> fmt::Debug for Hex<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#06x}", self.0)
            }
        }

        f.debug_struct("InputId")
            .field("bustype", &self.bus())
            .field("vendor", &Hex(self.vendor()))
            .field("product", &Hex(self.product()))
            .field("version", &Hex(self.version()))
            .finish()
    }
}

ffi_enum! {
    /// Bus types that devices can be attached to the system with.
    pub enum Bus: u16 {
        PCI         = 0x01,
        ISAPNP      = 0x02,
        USB         = 0x03,
        HIL         = 0x04,
        BLUETOOTH   = 0x05,
        VIRTUAL     = 0x06,
        ISA         = 0x10,
        I8042       = 0x11,
        XTKBD       = 0x12,
        RS232       = 0x13,
        GAMEPORT    = 0x14,
        PARPORT     = 0x15,
        AMIGA       = 0x16,
        ADB         = 0x17,
        I2C         = 0x18,
        HOST        = 0x19,
        GSC         = 0x1A,
        ATARI       = 0x1B,
        SPI         = 0x1C,
        RMI         = 0x1D,
        CEC         = 0x1E,
        INTEL_ISHTP = 0x1F,
        AMD_SFH     = 0x20,
    }
}

impl Bus {
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }
}

impl Default for InputId {
    #[inline]
    fn default() -> Self {
        Self::VIRTUAL_KEYBOARD
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant_name() {
            Some(name) => write!(f, "BUS_{name}"),
            None => write!(f, "Bus({:#x})", self.0),
        }
    }
}
