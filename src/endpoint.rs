// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Endpoint lock hysteresis.
//!
//! Snaps a duty near either end of the range to exactly 0 or 1000
//! and keeps it there until the input has clearly left the end zone.

use crate::{
    context::{MainCtx, MainCtxCell},
    DUTY_MAX,
};

pub struct EndpointParams {
    pub low_enter: u16,
    pub low_exit: u16,
    pub high_enter: u16,
    pub high_exit: u16,
    /// Consecutive samples to enter a lock.
    pub enter_count: u8,
    /// Consecutive samples to leave a lock.
    pub exit_count: u8,
}

pub const ENDPOINT_PARAMS: EndpointParams = EndpointParams {
    low_enter: 10,
    low_exit: 20,
    high_enter: 990,
    high_exit: 980,
    enter_count: 2,
    exit_count: 4,
};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Zone {
    Normal,
    LowLock,
    HighLock,
}

pub struct EndpointLock {
    zone: MainCtxCell<Zone>,
    /// The zone `count` counts towards.
    next: MainCtxCell<Zone>,
    count: MainCtxCell<u8>,
}

impl EndpointLock {
    pub const fn new() -> Self {
        Self {
            zone: MainCtxCell::new(Zone::Normal),
            next: MainCtxCell::new(Zone::Normal),
            count: MainCtxCell::new(0),
        }
    }

    /// Count one more consecutive sample towards `next` and check it against `limit`.
    fn count_up(&self, m: &MainCtx, next: Zone, limit: u8) -> bool {
        let count = if self.next.get(m) == next {
            self.count.get(m).saturating_add(1)
        } else {
            self.next.set(m, next);
            1
        };
        self.count.set(m, count);
        count >= limit
    }

    fn enter(&self, m: &MainCtx, zone: Zone) {
        self.zone.set(m, zone);
        self.next.set(m, zone);
        self.count.set(m, 0);
    }

    pub fn apply(&self, m: &MainCtx, p: &EndpointParams, duty: u16) -> u16 {
        match self.zone.get(m) {
            Zone::Normal => {
                if duty <= p.low_enter {
                    if self.count_up(m, Zone::LowLock, p.enter_count) {
                        self.enter(m, Zone::LowLock);
                        return 0;
                    }
                    duty
                } else if duty >= p.high_enter {
                    if self.count_up(m, Zone::HighLock, p.enter_count) {
                        self.enter(m, Zone::HighLock);
                        return DUTY_MAX;
                    }
                    p.high_enter
                } else {
                    self.count.set(m, 0);
                    duty
                }
            }
            Zone::LowLock => {
                if duty >= p.low_exit {
                    if self.count_up(m, Zone::Normal, p.exit_count) {
                        self.enter(m, Zone::Normal);
                        return duty;
                    }
                } else {
                    self.count.set(m, 0);
                }
                0
            }
            Zone::HighLock => {
                if duty <= p.high_exit {
                    if self.count_up(m, Zone::Normal, p.exit_count) {
                        self.enter(m, Zone::Normal);
                        return duty;
                    }
                } else {
                    self.count.set(m, 0);
                }
                DUTY_MAX
            }
        }
    }

    pub fn zone(&self, m: &MainCtx) -> Zone {
        self.zone.get(m)
    }
}

impl Default for EndpointLock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_ctx::main_ctx;

    #[test]
    fn test_low_lock() {
        let m = main_ctx();
        let e = EndpointLock::new();
        let p = &ENDPOINT_PARAMS;
        assert_eq!(e.apply(&m, p, 8), 8);
        assert_eq!(e.zone(&m), Zone::Normal);
        assert_eq!(e.apply(&m, p, 5), 0);
        assert_eq!(e.zone(&m), Zone::LowLock);

        // A single excursion does not unlock.
        assert_eq!(e.apply(&m, p, 500), 0);
        assert_eq!(e.apply(&m, p, 15), 0);
        assert_eq!(e.zone(&m), Zone::LowLock);

        assert_eq!(e.apply(&m, p, 30), 0);
        assert_eq!(e.apply(&m, p, 30), 0);
        assert_eq!(e.apply(&m, p, 30), 0);
        assert_eq!(e.apply(&m, p, 30), 30);
        assert_eq!(e.zone(&m), Zone::Normal);
    }

    #[test]
    fn test_high_lock() {
        let m = main_ctx();
        let e = EndpointLock::new();
        let p = &ENDPOINT_PARAMS;
        assert_eq!(e.apply(&m, p, 995), 990);
        assert_eq!(e.apply(&m, p, 999), 1000);
        assert_eq!(e.zone(&m), Zone::HighLock);
        assert_eq!(e.apply(&m, p, 985), 1000);
        for _ in 0..3 {
            assert_eq!(e.apply(&m, p, 900), 1000);
        }
        assert_eq!(e.apply(&m, p, 900), 900);
        assert_eq!(e.zone(&m), Zone::Normal);
    }

    #[test]
    fn test_interrupted_entry() {
        let m = main_ctx();
        let e = EndpointLock::new();
        let p = &ENDPOINT_PARAMS;
        assert_eq!(e.apply(&m, p, 3), 3);
        assert_eq!(e.apply(&m, p, 400), 400);
        assert_eq!(e.apply(&m, p, 3), 3);
        assert_eq!(e.zone(&m), Zone::Normal);
        assert_eq!(e.apply(&m, p, 3), 0);
        assert_eq!(e.zone(&m), Zone::LowLock);
    }

    #[test]
    fn test_entry_count_restarts_on_other_end() {
        let m = main_ctx();
        let e = EndpointLock::new();
        let p = &ENDPOINT_PARAMS;
        assert_eq!(e.apply(&m, p, 0), 0);
        assert_eq!(e.zone(&m), Zone::Normal);

        // The low sample does not count towards the high lock.
        assert_eq!(e.apply(&m, p, 999), 990);
        assert_eq!(e.zone(&m), Zone::Normal);
        assert_eq!(e.apply(&m, p, 999), 1000);
        assert_eq!(e.zone(&m), Zone::HighLock);

        // And the other way around.
        let e = EndpointLock::new();
        assert_eq!(e.apply(&m, p, 995), 990);
        assert_eq!(e.apply(&m, p, 2), 2);
        assert_eq!(e.zone(&m), Zone::Normal);
        assert_eq!(e.apply(&m, p, 2), 0);
        assert_eq!(e.zone(&m), Zone::LowLock);
    }
}

// vim: ts=4 sw=4 expandtab
