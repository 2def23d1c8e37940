//! Hardware-index targets and output limits.
//!
//! A hardware index is an abstract identifier the host uses for inputs and
//! outputs. Resolving one to a physical location is the I/O layer's job
//! (see [`crate::exec::DeviceServices`]); this module defines what a
//! resolved index looks like and which duty-cycle ceiling applies to each
//! output backend.

use crate::switches::N_SWITCH_WORDS;

/// Bits of software PWM resolution on expander-backed outputs.
pub const N_BIT_PWM: u8 = 4;

/// Highest duty value accepted for expander-backed outputs.
pub const MAX_EXPANDER_PWM: u16 = (1 << N_BIT_PWM) - 1;

/// Highest duty value accepted for hardware PWM channels.
pub const MAX_HW_PWM: u16 = 1500;

/// Position of an input in the switch bitmap (flat bit index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchPos(pub u16);

impl SwitchPos {
    /// Word index into the bitmap.
    pub fn word(&self) -> usize {
        (self.0 / 32) as usize
    }

    /// Bit mask within that word.
    pub fn mask(&self) -> u32 {
        1 << (self.0 % 32)
    }

    /// True if this position fits the bitmap.
    pub fn in_range(&self) -> bool {
        (self.0 as usize) < N_SWITCH_WORDS * 32
    }
}

/// Resolved location of an output hardware index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputTarget {
    /// Pin on an I2C GPIO expander, driven by software PWM.
    ExpanderPin { channel: u8, address: u8, pin: u8 },
    /// Dedicated hardware PWM channel.
    HwPwm { channel: u8 },
}

impl OutputTarget {
    /// Backend-dependent duty ceiling: `< 2^N_BIT_PWM` for expander pins,
    /// `<= MAX_HW_PWM` for hardware PWM.
    pub fn pwm_ceiling(&self) -> u16 {
        match self {
            OutputTarget::ExpanderPin { .. } => MAX_EXPANDER_PWM,
            OutputTarget::HwPwm { .. } => MAX_HW_PWM,
        }
    }

    pub fn pwm_in_range(&self, value: u16) -> bool {
        value <= self.pwm_ceiling()
    }
}
