//! ST7789 opcodes and the MADCTL flag set.

/// ST7789 commands used by the driver.
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    SWRESET = 0x01,
    SLPIN = 0x10,
    SLPOUT = 0x11,
    INVOFF = 0x20,
    INVON = 0x21,
    GAMSET = 0x26,
    DISPOFF = 0x28,
    DISPON = 0x29,
    CASET = 0x2A,
    RASET = 0x2B,
    RAMWR = 0x2C,
    TEOFF = 0x34,
    TEON = 0x35,
    MADCTL = 0x36,
    COLMOD = 0x3A,
    RAMCTRL = 0xB0,
    PORCTRL = 0xB2,
    GCTRL = 0xB7,
    VCOMS = 0xBB,
    LCMCTRL = 0xC0,
    VDVVRHEN = 0xC2,
    VRHS = 0xC3,
    VDVS = 0xC4,
    FRCTRL2 = 0xC6,
    PWMFRSEL = 0xCC,
    PWCTRL1 = 0xD0,
    GMCTRP1 = 0xE0,
    GMCTRN1 = 0xE1,
}

impl Command {
    pub const fn opcode(self) -> u8 {
        self as u8
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command.opcode()
    }
}

/// Memory data access control bits.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Madctl(u8);

impl Madctl {
    pub const ROW_ORDER: Self = Self(0b1000_0000);
    pub const COL_ORDER: Self = Self(0b0100_0000);
    /// Row/column exchange, aka "MV".
    pub const SWAP_XY: Self = Self(0b0010_0000);
    pub const SCAN_ORDER: Self = Self(0b0001_0000);
    pub const RGB_BGR: Self = Self(0b0000_1000);
    pub const HORIZ_ORDER: Self = Self(0b0000_0100);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl core::ops::BitOr for Madctl {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}
