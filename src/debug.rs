// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plain text diagnostic log points.
//!
//! Write errors are ignored. Logging never influences the control state.

use core::convert::Infallible;
use ufmt::{uWrite, uwriteln};

#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Debug {
    BandVoltage,
    PowerVoltage,
    Band,
    Power,
    Capture,
    Timeout,
    DcLevel,
    Mode,
    Input,
    Output,
}

impl Debug {
    const fn label(self) -> &'static str {
        match self {
            Self::BandVoltage => "band voltage(mv)",
            Self::PowerVoltage => "power voltage(mv)",
            Self::Band => "band",
            Self::Power => "power limit",
            Self::Capture => "capture duty",
            Self::Timeout => "capture timeout",
            Self::DcLevel => "dc level",
            Self::Mode => "mode",
            Self::Input => "input",
            Self::Output => "output",
        }
    }

    pub fn log_u16<W: uWrite>(self, w: &mut W, value: u16) {
        let _ = uwriteln!(w, "{}: {}", self.label(), value);
    }

    pub fn log_str<W: uWrite>(self, w: &mut W, value: &str) {
        let _ = uwriteln!(w, "{}: {}", self.label(), value);
    }

    /// Log a value that belongs to the numbered channel `chan`.
    pub fn log_chan_u16<W: uWrite>(self, w: &mut W, chan: u8, value: u16) {
        let _ = uwriteln!(w, "ch{} {}: {}", chan, self.label(), value);
    }

    pub fn log_chan_str<W: uWrite>(self, w: &mut W, chan: u8, value: &str) {
        let _ = uwriteln!(w, "ch{} {}: {}", chan, self.label(), value);
    }
}

/// Log sink that discards everything.
pub struct NoLog;

impl uWrite for NoLog {
    type Error = Infallible;

    #[inline(always)]
    fn write_str(&mut self, _s: &str) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_log {
    use super::*;
    use std::string::String;

    /// Log sink that collects the text.
    #[derive(Default)]
    pub struct TextLog(pub String);

    impl uWrite for TextLog {
        type Error = Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
            self.0.push_str(s);
            Ok(())
        }
    }
}


// vim: ts=4 sw=4 expandtab
