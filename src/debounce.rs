// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::context::{MainCtx, MainCtxCell};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DcLevel {
    /// Not enough consistent samples yet.
    Pending,
    Low,
    High,
}

/// Debounce of a static input level.
///
/// The level is reported after `LIMIT` consecutive equal samples.
pub struct Debounce<const LIMIT: u8> {
    level: MainCtxCell<bool>,
    count: MainCtxCell<u8>,
}

impl<const LIMIT: u8> Debounce<LIMIT> {
    pub const fn new() -> Self {
        Self {
            level: MainCtxCell::new(false),
            count: MainCtxCell::new(0),
        }
    }

    pub fn sample(&self, m: &MainCtx, level: bool) -> DcLevel {
        if level != self.level.get(m) {
            self.level.set(m, level);
            self.count.set(m, 1);
            return DcLevel::Pending;
        }

        let count = self.count.get(m).saturating_add(1).min(LIMIT);
        self.count.set(m, count);
        if count >= LIMIT {
            if level { DcLevel::High } else { DcLevel::Low }
        } else {
            DcLevel::Pending
        }
    }

    #[cfg(test)]
    pub fn count(&self, m: &MainCtx) -> u8 {
        self.count.get(m)
    }
}

impl<const LIMIT: u8> Default for Debounce<LIMIT> {
    fn default() -> Self {
        Self::new()
    }
}


// vim: ts=4 sw=4 expandtab
