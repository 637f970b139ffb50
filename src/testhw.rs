// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated hardware for the unit tests.

use crate::{
    adc::{AdcChannel, AdcHw},
    capture::{CaptureChannel, CaptureHw},
    conditioning::ControlChannel,
    irq::{GlobalIrq, IrqId, IrqLines},
    system::DutyOutput,
    DUTY_MAX,
};
use core::cell::Cell;

pub struct FakeLines {
    enabled: Cell<[bool; IrqId::COUNT]>,
}

impl FakeLines {
    pub fn new() -> Self {
        Self {
            enabled: Cell::new([false; IrqId::COUNT]),
        }
    }
}

impl IrqLines for FakeLines {
    fn is_enabled(&self, id: IrqId) -> bool {
        self.enabled.get()[id as usize]
    }

    fn set_enabled(&self, id: IrqId, enabled: bool) {
        let mut lines = self.enabled.get();
        lines[id as usize] = enabled;
        self.enabled.set(lines);
    }
}

pub struct FakeGlobal {
    enabled: Cell<bool>,
    enable_count: Cell<u8>,
}

impl FakeGlobal {
    pub fn new() -> Self {
        Self {
            enabled: Cell::new(false),
            enable_count: Cell::new(0),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn enable_count(&self) -> u8 {
        self.enable_count.get()
    }
}

impl GlobalIrq for FakeGlobal {
    unsafe fn enable(&self) {
        self.enabled.set(true);
        self.enable_count.set(self.enable_count.get() + 1);
    }

    fn disable(&self) {
        self.enabled.set(false);
    }
}

pub struct FakeBoard {
    lines: FakeLines,
    adc_selected: Cell<Option<AdcChannel>>,
    adc_result: Cell<u16>,
    levels: Cell<[bool; CaptureChannel::COUNT]>,
    level_reads: Cell<[u8; CaptureChannel::COUNT]>,
    cleared: Cell<[u8; CaptureChannel::COUNT]>,
    duty: Cell<[Option<u16>; ControlChannel::COUNT]>,
    duty_writes: Cell<u8>,
}

impl FakeBoard {
    pub fn new() -> Self {
        Self {
            lines: FakeLines::new(),
            adc_selected: Cell::new(None),
            adc_result: Cell::new(0),
            levels: Cell::new([false; CaptureChannel::COUNT]),
            level_reads: Cell::new([0; CaptureChannel::COUNT]),
            cleared: Cell::new([0; CaptureChannel::COUNT]),
            duty: Cell::new([None; ControlChannel::COUNT]),
            duty_writes: Cell::new(0),
        }
    }

    pub fn adc_selected(&self) -> Option<AdcChannel> {
        self.adc_selected.get()
    }

    pub fn set_adc_result(&self, value: u16) {
        self.adc_result.set(value);
    }

    pub fn set_level(&self, chan: CaptureChannel, level: bool) {
        let mut levels = self.levels.get();
        levels[chan as usize] = level;
        self.levels.set(levels);
    }

    pub fn level_reads(&self, chan: CaptureChannel) -> u8 {
        self.level_reads.get()[chan as usize]
    }

    pub fn pending_cleared(&self, chan: CaptureChannel) -> u8 {
        self.cleared.get()[chan as usize]
    }

    pub fn duty(&self, chan: ControlChannel) -> Option<u16> {
        self.duty.get()[chan as usize]
    }

    pub fn duty_writes(&self) -> u8 {
        self.duty_writes.get()
    }
}

impl IrqLines for FakeBoard {
    fn is_enabled(&self, id: IrqId) -> bool {
        self.lines.is_enabled(id)
    }

    fn set_enabled(&self, id: IrqId, enabled: bool) {
        self.lines.set_enabled(id, enabled);
    }
}

impl AdcHw for FakeBoard {
    fn start_conversion(&self, chan: AdcChannel) {
        self.adc_selected.set(Some(chan));
    }

    fn conversion_result(&self) -> u16 {
        self.adc_result.get()
    }
}

impl CaptureHw for FakeBoard {
    fn input_level(&self, chan: CaptureChannel) -> bool {
        let mut reads = self.level_reads.get();
        reads[chan as usize] += 1;
        self.level_reads.set(reads);
        self.levels.get()[chan as usize]
    }

    fn clear_pending(&self, chan: CaptureChannel) {
        let mut cleared = self.cleared.get();
        cleared[chan as usize] += 1;
        self.cleared.set(cleared);
    }
}

impl DutyOutput for FakeBoard {
    fn set_duty(&self, chan: ControlChannel, duty: u16) {
        let mut all = self.duty.get();
        all[chan as usize] = Some(duty.min(DUTY_MAX));
        self.duty.set(all);
        self.duty_writes.set(self.duty_writes.get() + 1);
    }
}

// vim: ts=4 sw=4 expandtab
