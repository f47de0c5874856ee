//! Board profiles: which BCM pins exist on each Raspberry Pi generation.
//!
//! Pin maps follow the header layouts documented at
//! <http://elinux.org/RPi_Low-level_peripherals>.

use serde::{Deserialize, Serialize};

const REV1_PINS: &[u8] = &[0, 1, 4, 7, 8, 9, 10, 11, 14, 15, 17, 18, 21, 22, 23, 24, 25];
const REV1_HACKABLE: &[u8] = &[4, 7, 8, 9, 10, 11, 17, 18, 21, 22, 23, 24, 25];

const REV2_PINS: &[u8] = &[2, 3, 4, 7, 8, 9, 10, 11, 14, 15, 17, 18, 22, 23, 24, 25, 27];
const REV2_HACKABLE: &[u8] = &[4, 7, 8, 9, 10, 11, 17, 18, 22, 23, 24, 25, 27];

const BPLUS_PINS: &[u8] = &[
    2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27,
];
const BPLUS_HACKABLE: &[u8] = &[4, 5, 6, 12, 13, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27];

/// Header layout generation of a Raspberry Pi board.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BoardGeneration {
    /// Original 26-pin header (revision codes below 4)
    Rev1,
    /// Revised 26-pin header (revision codes 4 to 15)
    Rev2,
    /// 40-pin header, B+ and everything after it
    FortyPin,
}

/// The GPIO pins available on a board generation.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct BoardProfile {
    /// Header generation this profile describes
    pub generation: BoardGeneration,
    valid_pins: &'static [u8],
    hackable_pins: &'static [u8],
}

impl BoardProfile {
    /// Pick the pin map for a hardware revision code from `/proc/cpuinfo`.
    pub fn resolve(revision: u32) -> Self {
        let generation = if revision < 4 {
            BoardGeneration::Rev1
        } else if revision < 16 {
            BoardGeneration::Rev2
        } else {
            BoardGeneration::FortyPin
        };
        Self::for_generation(generation)
    }

    /// The pin map for a known generation.
    pub fn for_generation(generation: BoardGeneration) -> Self {
        let (valid_pins, hackable_pins) = match generation {
            BoardGeneration::Rev1 => (REV1_PINS, REV1_HACKABLE),
            BoardGeneration::Rev2 => (REV2_PINS, REV2_HACKABLE),
            BoardGeneration::FortyPin => (BPLUS_PINS, BPLUS_HACKABLE),
        };
        Self {
            generation,
            valid_pins,
            hackable_pins,
        }
    }

    /// Every BCM pin addressable on this board, ascending.
    pub fn valid_pins(&self) -> &'static [u8] {
        self.valid_pins
    }

    /// Pins free of special functions, safe for general use.
    pub fn hackable_pins(&self) -> &'static [u8] {
        self.hackable_pins
    }

    pub fn is_valid_pin(&self, pin: u8) -> bool {
        self.valid_pins.contains(&pin)
    }

    pub fn is_hackable_pin(&self, pin: u8) -> bool {
        self.hackable_pins.contains(&pin)
    }
}
