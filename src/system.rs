// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    adc::{Adc, AdcChannel, AdcHw},
    capture::{Capture, CaptureHw},
    conditioning::{Channel, ControlChannel},
    context::{MainCtx, MainCtxCell},
    debug::Debug,
    switch::{BandPosition, Millivolts, PowerLimit},
};
use ufmt::uWrite;

/// Period of [System::run], in milliseconds.
pub const CONTROL_PERIOD_MS: u8 = 5;

/// Output stage.
pub trait DutyOutput {
    /// Set the output duty in 0..=1000.
    /// Larger values are clamped.
    fn set_duty(&self, chan: ControlChannel, duty: u16);
}

/// All hardware the control loop talks to.
pub trait Board: AdcHw + CaptureHw + DutyOutput {}

impl<T: AdcHw + CaptureHw + DutyOutput> Board for T {}

pub struct System {
    adc: Adc,
    capture: Capture,
    channels: [Channel; ControlChannel::COUNT],
    power: MainCtxCell<PowerLimit>,
}

impl System {
    pub const fn new() -> Self {
        Self {
            adc: Adc::new(),
            capture: Capture::new(),
            channels: [
                Channel::new(ControlChannel::Channel1),
                Channel::new(ControlChannel::Channel2),
            ],
            power: MainCtxCell::new(PowerLimit::Pct100),
        }
    }

    /// The ADC engine. Its interrupt handler is called by the board.
    pub fn adc(&self) -> &Adc {
        &self.adc
    }

    /// The capture engine. Its interrupt handlers are called by the board.
    pub fn capture(&self) -> &Capture {
        &self.capture
    }

    pub fn channel(&self, chan: ControlChannel) -> &Channel {
        &self.channels[chan as usize]
    }

    pub fn power(&self, m: &MainCtx) -> PowerLimit {
        self.power.get(m)
    }

    /// Initialize and start both acquisition engines.
    ///
    /// Must be called once before the first [System::run].
    pub fn init(&self, m: &MainCtx, hw: &impl Board) {
        for ch in &self.channels {
            ch.init(m);
        }
        self.adc.start(m, hw, true);
        for chan in ControlChannel::ALL {
            self.capture.start(m, hw, chan.capture());
        }
    }

    fn update_switches<W: uWrite>(&self, m: &MainCtx, hw: &impl Board, log: &mut W) {
        for ch in &self.channels {
            if let Some(raw) = self.adc.get(m, hw, ch.id().band_select()) {
                let mv = Millivolts::from_adc(raw);
                let band = BandPosition::from_millivolts(mv);
                Debug::BandVoltage.log_chan_u16(log, ch.id().number(), mv.into());
                Debug::Band.log_chan_str(log, ch.id().number(), band.name());
                ch.set_band(m, band);
            }
        }

        if let Some(raw) = self.adc.get(m, hw, AdcChannel::PowerLimit) {
            let mv = Millivolts::from_adc(raw);
            let power = PowerLimit::from_millivolts(mv);
            Debug::PowerVoltage.log_u16(log, mv.into());
            Debug::Power.log_str(log, power.name());
            self.power.set(m, power);
        }
    }

    /// Run one control cycle.
    pub fn run<W: uWrite>(&self, m: &MainCtx, hw: &impl Board, log: &mut W) {
        self.update_switches(m, hw, log);

        let power = self.power.get(m);
        for ch in &self.channels {
            let chan = ch.id();
            let captured = if ch.band(m).is_external() {
                self.capture.get_duty(m, hw, chan.capture())
            } else {
                None
            };
            let level = || hw.input_level(chan.capture());
            if let Some(duty) = ch.run(m, captured, level, power, log) {
                hw.set_duty(chan, duty);
            }
        }

        // Prepare the next cycle.
        self.adc.start(m, hw, false);
        for chan in ControlChannel::ALL {
            self.capture.start(m, hw, chan.capture());
        }
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        capture::{CaptureChannel, Edge},
        conditioning::ControlMode,
        context::test_ctx::{irq_ctx, main_ctx},
        debug::{NoLog, test_log::TextLog},
        irq::{IrqId, IrqLines},
        testhw::FakeBoard,
        timer::Timestamp,
    };

    /// Raw ADC values of the switch positions.
    const RAW_EXT: u16 = 10;
    const RAW_PCT50: u16 = 608; // 2968 mV
    const RAW_PCT100: u16 = 1023;
    const RAW_POWER83: u16 = 614; // 2998 mV
    const RAW_POWER100: u16 = 942; // 4599 mV

    fn complete_adc(sys: &System, hw: &FakeBoard, values: [u16; AdcChannel::COUNT]) {
        let c = irq_ctx();
        while let Some(chan) = hw.adc_selected() {
            hw.set_adc_result(values[chan as usize]);
            if !sys.adc().irq_conversion_complete(&c, hw) {
                break;
            }
        }
    }

    fn capture(sys: &System, chan: CaptureChannel, rising: u16, falling: u16) {
        let c = irq_ctx();
        sys.capture().irq_edge(&c, chan, Edge::Rising, Timestamp(rising));
        sys.capture().irq_edge(&c, chan, Edge::Falling, Timestamp(falling));
    }

    #[test]
    fn test_init_starts_engines() {
        let m = main_ctx();
        let hw = FakeBoard::new();
        let sys = System::new();
        sys.init(&m, &hw);
        assert!(hw.is_enabled(IrqId::Adc));
        assert!(hw.is_enabled(IrqId::Capture1));
        assert!(hw.is_enabled(IrqId::Capture2));
        assert!(sys.adc().is_running(&m, &hw));
    }

    #[test]
    fn test_local_and_external() {
        let m = main_ctx();
        let hw = FakeBoard::new();
        let sys = System::new();
        sys.init(&m, &hw);

        complete_adc(&sys, &hw, [RAW_PCT50, RAW_EXT, RAW_POWER100]);
        capture(&sys, CaptureChannel::External1, 100, 900);
        capture(&sys, CaptureChannel::External2, 65000, 100);
        sys.run(&m, &hw, &mut NoLog);

        let ch1 = sys.channel(ControlChannel::Channel1);
        let ch2 = sys.channel(ControlChannel::Channel2);
        assert_eq!(ch1.band(&m), BandPosition::Pct50);
        assert_eq!(ch1.mode(&m), ControlMode::Local);
        assert_eq!(ch2.mode(&m), ControlMode::External);
        assert_eq!(sys.power(&m), PowerLimit::Pct100);
        assert_eq!(hw.duty(ControlChannel::Channel1), Some(500));
        assert_eq!(hw.duty(ControlChannel::Channel2), Some(636));

        // Both engines are re-armed.
        assert!(sys.adc().is_running(&m, &hw));
        assert_eq!(sys.capture().get_duty(&m, &hw, CaptureChannel::External2), None);
    }

    #[test]
    fn test_not_ready_adc_keeps_switches() {
        let m = main_ctx();
        let hw = FakeBoard::new();
        let sys = System::new();
        sys.init(&m, &hw);

        complete_adc(&sys, &hw, [RAW_PCT100, RAW_PCT50, RAW_POWER83]);
        sys.run(&m, &hw, &mut NoLog);
        assert_eq!(hw.duty(ControlChannel::Channel1), Some(833));
        assert_eq!(hw.duty(ControlChannel::Channel2), Some(416));
        let writes = hw.duty_writes();

        // The batch started by the last cycle has not completed.
        sys.run(&m, &hw, &mut NoLog);
        assert_eq!(sys.channel(ControlChannel::Channel1).band(&m), BandPosition::Pct100);
        assert_eq!(sys.power(&m), PowerLimit::Pct83);
        assert_eq!(hw.duty_writes(), writes);
    }

    #[test]
    fn test_capture_timeout_reads_pin() {
        let m = main_ctx();
        let hw = FakeBoard::new();
        let sys = System::new();
        sys.init(&m, &hw);
        complete_adc(&sys, &hw, [RAW_EXT, RAW_EXT, RAW_POWER100]);

        hw.set_level(CaptureChannel::External1, true);
        for _ in 0..4 {
            sys.run(&m, &hw, &mut NoLog);
        }
        assert!(hw.level_reads(CaptureChannel::External1) >= 3);
    }

    #[test]
    fn test_log() {
        let m = main_ctx();
        let hw = FakeBoard::new();
        let sys = System::new();
        sys.init(&m, &hw);
        complete_adc(&sys, &hw, [RAW_PCT50, RAW_PCT50, RAW_POWER83]);

        let mut log = TextLog::default();
        sys.run(&m, &hw, &mut log);
        assert!(log.0.contains("ch1 band voltage(mv): 2968\n"));
        assert!(log.0.contains("ch2 band: 50%\n"));
        assert!(log.0.contains("power limit: 83%\n"));
        assert!(log.0.contains("ch2 output: 416\n"));
    }
}

// vim: ts=4 sw=4 expandtab
