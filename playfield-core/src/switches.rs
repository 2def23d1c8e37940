//! Debounced switch bitmap and its wire report.

use core::fmt::Write;

use heapless::String;

use crate::hwindex::SwitchPos;

/// Number of 32-bit words in the switch bitmap.
pub const N_SWITCH_WORDS: usize = 5;

/// `SW:` + 8 hex digits per word + newline.
pub const SWITCH_REPORT_CAPACITY: usize = 3 + N_SWITCH_WORDS * 8 + 1;

/// State of all switches, one bit each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchState {
    words: [u32; N_SWITCH_WORDS],
}

impl SwitchState {
    pub const fn new() -> Self {
        Self {
            words: [0; N_SWITCH_WORDS],
        }
    }

    pub const fn from_words(words: [u32; N_SWITCH_WORDS]) -> Self {
        Self { words }
    }

    pub fn get(&self, pos: SwitchPos) -> bool {
        self.words[pos.word()] & pos.mask() != 0
    }

    pub fn set(&mut self, pos: SwitchPos, closed: bool) {
        if closed {
            self.words[pos.word()] |= pos.mask();
        } else {
            self.words[pos.word()] &= !pos.mask();
        }
    }

    pub fn words(&self) -> &[u32; N_SWITCH_WORDS] {
        &self.words
    }

    /// Serialize as `SW:` followed by one fixed-width 8-hex-digit word per
    /// 32-bit block, then a newline. An overflow of the output buffer
    /// aborts the whole response.
    pub fn report(&self) -> Result<String<SWITCH_REPORT_CAPACITY>, core::fmt::Error> {
        let mut out = String::new();
        write!(out, "SW:")?;
        for word in &self.words {
            write!(out, "{:08x}", word)?;
        }
        writeln!(out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_zero_report() {
        let report = SwitchState::new().report().unwrap();
        assert_eq!(report.len(), 44);
        assert_eq!(
            report.as_str(),
            "SW:0000000000000000000000000000000000000000\n"
        );
    }

    #[test]
    fn test_report_is_fixed_width() {
        let state = SwitchState::from_words([0x1, 0xdeadbeef, 0, 0, 0x80000000]);
        assert_eq!(
            state.report().unwrap().as_str(),
            "SW:00000001deadbeef000000000000000080000000\n"
        );
    }

    #[test]
    fn test_set_and_get() {
        let mut state = SwitchState::new();
        let pos = SwitchPos(37);
        assert!(!state.get(pos));
        state.set(pos, true);
        assert!(state.get(pos));
        assert_eq!(state.words()[1], 1 << 5);
        state.set(pos, false);
        assert!(!state.get(pos));
    }
}
