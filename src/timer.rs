// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capture counter timestamps.
//!
//! The capture counter is a free running 16 bit counter with 1 us per tick.
//! All arithmetic wraps at the counter width.

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct Timestamp(pub u16);

impl Timestamp {
    #[inline]
    pub const fn new() -> Self {
        Timestamp(0)
    }

    /// Number of ticks from `earlier` to `self`,
    /// modulo the counter width.
    #[inline]
    pub const fn ticks_since(self, earlier: Self) -> u16 {
        self.0.wrapping_sub(earlier.0)
    }
}

impl From<u16> for Timestamp {
    #[inline]
    fn from(stamp: u16) -> Self {
        Timestamp(stamp)
    }
}


// vim: ts=4 sw=4 expandtab
