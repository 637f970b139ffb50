// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decoding of the rotary switches.
//!
//! Each switch is a resistor ladder. Its position is read as a voltage.

use crate::DUTY_MAX;

/// ADC reference voltage.
const VREF_MV: u32 = 5000;
/// Full scale of the 10 bit ADC.
const ADC_FULL_SCALE: u32 = 1024;
/// Tolerance around each nominal switch voltage.
const WINDOW_MV: u16 = 200;

#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    derive_more::From,
    derive_more::Into,
)]
pub struct Millivolts(pub u16);

impl Millivolts {
    /// Convert an averaged raw ADC value.
    pub const fn from_adc(raw: u16) -> Self {
        Self((raw as u32 * VREF_MV / ADC_FULL_SCALE) as u16)
    }

    /// Returns true, if self is within the tolerance window around `nominal`.
    fn near(self, nominal: u16) -> bool {
        self.0.abs_diff(nominal) <= WINDOW_MV
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum BandPosition {
    /// Not in any known window.
    Unknown,
    /// Follow the external PWM input.
    External,
    Pct0,
    Pct25,
    Pct50,
    Pct75,
    Pct100,
}

const BAND_WINDOWS: [(u16, BandPosition); 6] = [
    (0, BandPosition::External),
    (1000, BandPosition::Pct0),
    (1830, BandPosition::Pct25),
    (2970, BandPosition::Pct50),
    (4050, BandPosition::Pct75),
    (5000, BandPosition::Pct100),
];

impl BandPosition {
    pub fn from_millivolts(mv: Millivolts) -> Self {
        for (nominal, pos) in BAND_WINDOWS {
            if mv.near(nominal) {
                return pos;
            }
        }
        Self::Unknown
    }

    pub fn is_external(self) -> bool {
        self == Self::External
    }

    /// The local duty setting of this position.
    ///
    /// Positions without a local setting give 0.
    pub fn duty(self) -> u16 {
        match self {
            Self::Unknown | Self::External | Self::Pct0 => 0,
            Self::Pct25 => DUTY_MAX >> 2,
            Self::Pct50 => DUTY_MAX >> 1,
            Self::Pct75 => (DUTY_MAX * 3) >> 2,
            Self::Pct100 => DUTY_MAX,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "?",
            Self::External => "ext",
            Self::Pct0 => "0%",
            Self::Pct25 => "25%",
            Self::Pct50 => "50%",
            Self::Pct75 => "75%",
            Self::Pct100 => "100%",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum PowerLimit {
    Unknown,
    Pct67,
    Pct83,
    Pct100,
}

const POWER_WINDOWS: [(u16, PowerLimit); 3] = [
    (0, PowerLimit::Pct67),
    (3000, PowerLimit::Pct83),
    (4600, PowerLimit::Pct100),
];

impl PowerLimit {
    pub fn from_millivolts(mv: Millivolts) -> Self {
        for (nominal, limit) in POWER_WINDOWS {
            if mv.near(nominal) {
                return limit;
            }
        }
        Self::Unknown
    }

    /// Scale a duty by this limit.
    ///
    /// An unknown limit does not scale.
    pub fn scale(self, duty: u16) -> u16 {
        let permille: u32 = match self {
            Self::Pct67 => 667,
            Self::Pct83 => 833,
            Self::Pct100 | Self::Unknown => return duty,
        };
        (duty as u32 * permille / 1000) as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "?",
            Self::Pct67 => "67%",
            Self::Pct83 => "83%",
            Self::Pct100 => "100%",
        }
    }
}


// vim: ts=4 sw=4 expandtab
