// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Duty cycle measurement of the external PWM inputs.
//!
//! Each input has its own edge interrupt.
//! The timestamps of one rising and the following falling edge
//! give the high time of the input signal.

use crate::{
    context::{IrqCtx, MainCtx},
    irq::{IrqId, IrqLines, IrqShared},
    timer::Timestamp,
};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum CaptureChannel {
    External1,
    External2,
}

impl CaptureChannel {
    pub const COUNT: usize = 2;

    pub const fn irq(self) -> IrqId {
        match self {
            Self::External1 => IrqId::Capture1,
            Self::External2 => IrqId::Capture2,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Edge {
    Rising,
    Falling,
}

pub trait CaptureHw: IrqLines {
    /// Current logic level of the input pin.
    fn input_level(&self, chan: CaptureChannel) -> bool;

    /// Discard an edge event that is pending in hardware.
    fn clear_pending(&self, chan: CaptureChannel);
}

struct Record {
    rising: Timestamp,
    falling: Timestamp,
    duty: u16,
    rising_seen: bool,
    complete: bool,
    armed: bool,
}

impl Record {
    const fn new() -> Self {
        Self {
            rising: Timestamp::new(),
            falling: Timestamp::new(),
            duty: 0,
            rising_seen: false,
            complete: false,
            armed: false,
        }
    }
}

pub struct Capture {
    rec: [IrqShared<Record>; CaptureChannel::COUNT],
}

impl Capture {
    pub const fn new() -> Self {
        Self {
            rec: [IrqShared::new(Record::new()), IrqShared::new(Record::new())],
        }
    }

    /// Arm the channel for a new measurement.
    ///
    /// A measurement that is already in flight continues.
    pub fn start(&self, m: &MainCtx, hw: &impl CaptureHw, chan: CaptureChannel) {
        self.rec[chan as usize].lock(m, hw, chan.irq(), |r| {
            r.complete = false;
            if !r.armed {
                r.rising_seen = false;
                r.armed = true;
                hw.clear_pending(chan);
            }
        });
        hw.set_enabled(chan.irq(), true);
    }

    /// Disarm the channel.
    ///
    /// The capture counter keeps running.
    pub fn stop(&self, m: &MainCtx, hw: &impl CaptureHw, chan: CaptureChannel) {
        self.rec[chan as usize].lock(m, hw, chan.irq(), |r| {
            r.armed = false;
        });
        hw.set_enabled(chan.irq(), false);
    }

    /// Get the high time of the last completed measurement, in capture counter ticks.
    pub fn get_duty(&self, m: &MainCtx, hw: &impl CaptureHw, chan: CaptureChannel) -> Option<u16> {
        self.rec[chan as usize].lock(m, hw, chan.irq(), |r| {
            if r.complete { Some(r.duty) } else { None }
        })
    }

    /// Edge interrupt.
    ///
    /// `stamp` is the capture counter value at the edge.
    /// Returns the new enable state of the interrupt.
    pub fn irq_edge(&self, c: &IrqCtx, chan: CaptureChannel, edge: Edge, stamp: Timestamp) -> bool {
        self.rec[chan as usize].irq(c, |r| {
            if !r.armed {
                return false;
            }
            match edge {
                Edge::Rising => {
                    r.rising = stamp;
                    r.rising_seen = true;
                }
                Edge::Falling => {
                    r.falling = stamp;
                    if r.rising_seen {
                        r.duty = r.falling.ticks_since(r.rising);
                        r.complete = true;
                        r.armed = false;
                    }
                }
            }
            r.armed
        })
    }
}

impl Default for Capture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::test_ctx::{irq_ctx, main_ctx},
        testhw::FakeBoard,
    };

    use super::CaptureChannel::{External1, External2};

    #[test]
    fn test_duty() {
        let m = main_ctx();
        let c = irq_ctx();
        let hw = FakeBoard::new();
        let cap = Capture::new();

        cap.start(&m, &hw, External1);
        assert!(hw.is_enabled(IrqId::Capture1));
        assert!(!hw.is_enabled(IrqId::Capture2));
        assert_eq!(cap.get_duty(&m, &hw, External1), None);

        assert!(cap.irq_edge(&c, External1, Edge::Rising, Timestamp(1000)));
        assert_eq!(cap.get_duty(&m, &hw, External1), None);
        assert!(!cap.irq_edge(&c, External1, Edge::Falling, Timestamp(1250)));
        assert_eq!(cap.get_duty(&m, &hw, External1), Some(250));
        assert_eq!(cap.get_duty(&m, &hw, External2), None);

        // Completion persists until the next start.
        assert_eq!(cap.get_duty(&m, &hw, External1), Some(250));
        cap.start(&m, &hw, External1);
        assert_eq!(cap.get_duty(&m, &hw, External1), None);
    }

    #[test]
    fn test_rollover() {
        let m = main_ctx();
        let c = irq_ctx();
        let hw = FakeBoard::new();
        let cap = Capture::new();
        cap.start(&m, &hw, External2);
        cap.irq_edge(&c, External2, Edge::Rising, Timestamp(65000));
        cap.irq_edge(&c, External2, Edge::Falling, Timestamp(100));
        assert_eq!(cap.get_duty(&m, &hw, External2), Some(636));
    }

    #[test]
    fn test_falling_first() {
        let m = main_ctx();
        let c = irq_ctx();
        let hw = FakeBoard::new();
        let cap = Capture::new();
        cap.start(&m, &hw, External1);
        assert!(cap.irq_edge(&c, External1, Edge::Falling, Timestamp(10)));
        assert_eq!(cap.get_duty(&m, &hw, External1), None);
        cap.irq_edge(&c, External1, Edge::Rising, Timestamp(20));
        cap.irq_edge(&c, External1, Edge::Falling, Timestamp(520));
        assert_eq!(cap.get_duty(&m, &hw, External1), Some(500));
    }

    #[test]
    fn test_restart_clears_stale_rising_edge() {
        let m = main_ctx();
        let c = irq_ctx();
        let hw = FakeBoard::new();
        let cap = Capture::new();
        cap.start(&m, &hw, External1);
        cap.irq_edge(&c, External1, Edge::Rising, Timestamp(20));
        cap.stop(&m, &hw, External1);
        assert!(!hw.is_enabled(IrqId::Capture1));

        // Disarmed: edges are ignored.
        assert!(!cap.irq_edge(&c, External1, Edge::Falling, Timestamp(100)));
        assert_eq!(cap.get_duty(&m, &hw, External1), None);

        cap.start(&m, &hw, External1);
        assert_eq!(hw.pending_cleared(External1), 2);
        assert!(cap.irq_edge(&c, External1, Edge::Falling, Timestamp(200)));
        assert_eq!(cap.get_duty(&m, &hw, External1), None);
    }

    #[test]
    fn test_stop_leaves_sibling() {
        let m = main_ctx();
        let c = irq_ctx();
        let hw = FakeBoard::new();
        let cap = Capture::new();
        cap.start(&m, &hw, External1);
        cap.start(&m, &hw, External2);
        cap.irq_edge(&c, External2, Edge::Rising, Timestamp(1000));

        cap.stop(&m, &hw, External1);
        assert!(!hw.is_enabled(IrqId::Capture1));
        assert!(hw.is_enabled(IrqId::Capture2));

        assert!(!cap.irq_edge(&c, External1, Edge::Rising, Timestamp(1100)));
        assert!(!cap.irq_edge(&c, External2, Edge::Falling, Timestamp(1300)));
        assert_eq!(cap.get_duty(&m, &hw, External1), None);
        assert_eq!(cap.get_duty(&m, &hw, External2), Some(300));
    }

    #[test]
    fn test_start_while_armed() {
        let m = main_ctx();
        let c = irq_ctx();
        let hw = FakeBoard::new();
        let cap = Capture::new();
        cap.start(&m, &hw, External2);
        cap.irq_edge(&c, External2, Edge::Rising, Timestamp(300));
        cap.start(&m, &hw, External2);
        assert_eq!(hw.pending_cleared(External2), 1);
        cap.irq_edge(&c, External2, Edge::Falling, Timestamp(700));
        assert_eq!(cap.get_duty(&m, &hw, External2), Some(400));
    }
}

// vim: ts=4 sw=4 expandtab
