// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::context::{MainCtx, MainCtxCell};

/// Single pole exponential smoothing filter
/// with dead-band step and outlier rejection.
pub struct Filter {
    ave: MainCtxCell<u16>,
    len: MainCtxCell<u16>,
    first: MainCtxCell<bool>,
}

impl Filter {
    pub const fn new() -> Self {
        Self {
            ave: MainCtxCell::new(0),
            len: MainCtxCell::new(0),
            first: MainCtxCell::new(false),
        }
    }

    /// Initialize the filter.
    ///
    /// The first update after init adopts its sample verbatim.
    pub fn init(&self, m: &MainCtx, enabled: bool, initial: u16, len: u16) {
        if !enabled || len == 0 {
            return;
        }
        self.ave.set(m, initial);
        self.len.set(m, len);
        self.first.set(m, true);
    }

    /// Force the average to `value`.
    pub fn reset(&self, m: &MainCtx, value: u16) {
        self.ave.set(m, value);
        self.first.set(m, false);
    }

    #[inline(never)]
    pub fn update(
        &self,
        m: &MainCtx,
        enabled: bool,
        sample: u16,
        dead_band: u16,
        max_err: u16,
    ) -> u16 {
        let ave = self.ave.get(m);
        let len = self.len.get(m);
        if !enabled || len == 0 || max_err < dead_band {
            return ave;
        }

        if self.first.get(m) {
            self.first.set(m, false);
            self.ave.set(m, sample);
            return sample;
        }

        let err = sample.abs_diff(ave);
        if err > max_err {
            // Outlier.
            return ave;
        }
        let ave = if err > dead_band {
            sample
        } else {
            let len = len as u32;
            ((ave as u32 * (len - 1) + sample as u32) / len) as u16
        };
        self.ave.set(m, ave);
        ave
    }

    pub fn get(&self, m: &MainCtx) -> u16 {
        self.ave.get(m)
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}


// vim: ts=4 sw=4 expandtab
