// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per channel signal conditioning.
//!
//! Turns the band switch position or the measured external duty
//! into the output duty of one channel.

use crate::{
    DUTY_MAX,
    adc::AdcChannel,
    capture::CaptureChannel,
    context::{MainCtx, MainCtxCell},
    debounce::{DcLevel, Debounce},
    debug::Debug,
    endpoint::{ENDPOINT_PARAMS, EndpointLock},
    filter::Filter,
    switch::{BandPosition, PowerLimit},
};
use ufmt::uWrite;

/// Length of the input smoothing filter.
const FILTER_LEN: u16 = 4;
/// Input steps larger than this are taken without smoothing.
const FILTER_DEAD_BAND: u16 = 10;
/// Input steps larger than this are rejected as outliers.
const FILTER_MAX_ERR: u16 = 100;
/// The filter only runs if the target moved at least this far from the input.
const CHANGE_WINDOW: u16 = 10;
/// The output stage is only updated if the output moved at least this far.
const OUTPUT_THRESHOLD: u16 = 5;
/// Control cycles without a completed capture until the input pin level is used.
const CAPTURE_TIMEOUT: u8 = 2;
/// Consecutive equal pin level samples for a static input level.
const DC_LEVEL_COUNT: u8 = 3;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum ControlChannel {
    Channel1,
    Channel2,
}

impl ControlChannel {
    pub const COUNT: usize = 2;
    pub const ALL: [ControlChannel; Self::COUNT] = [Self::Channel1, Self::Channel2];

    pub const fn capture(self) -> CaptureChannel {
        match self {
            Self::Channel1 => CaptureChannel::External1,
            Self::Channel2 => CaptureChannel::External2,
        }
    }

    pub const fn band_select(self) -> AdcChannel {
        match self {
            Self::Channel1 => AdcChannel::BandSelect1,
            Self::Channel2 => AdcChannel::BandSelect2,
        }
    }

    /// Channel number as printed on the board.
    pub const fn number(self) -> u8 {
        self as u8 + 1
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ControlMode {
    Local,
    External,
}

impl ControlMode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::External => "ext",
        }
    }
}

pub struct Channel {
    id: ControlChannel,
    filter: Filter,
    endpoint: EndpointLock,
    dc_level: Debounce<DC_LEVEL_COUNT>,
    band: MainCtxCell<BandPosition>,
    mode: MainCtxCell<ControlMode>,
    timeout: MainCtxCell<u8>,
    input: MainCtxCell<u16>,
    output: MainCtxCell<u16>,
    applied: MainCtxCell<u16>,
}

impl Channel {
    pub const fn new(id: ControlChannel) -> Self {
        Self {
            id,
            filter: Filter::new(),
            endpoint: EndpointLock::new(),
            dc_level: Debounce::new(),
            band: MainCtxCell::new(BandPosition::External),
            mode: MainCtxCell::new(ControlMode::External),
            timeout: MainCtxCell::new(0),
            input: MainCtxCell::new(0),
            output: MainCtxCell::new(0),
            applied: MainCtxCell::new(0),
        }
    }

    pub fn init(&self, m: &MainCtx) {
        self.filter.init(m, true, 0, FILTER_LEN);
    }

    pub fn id(&self) -> ControlChannel {
        self.id
    }

    pub fn set_band(&self, m: &MainCtx, band: BandPosition) {
        self.band.set(m, band);
    }

    pub fn band(&self, m: &MainCtx) -> BandPosition {
        self.band.get(m)
    }

    pub fn mode(&self, m: &MainCtx) -> ControlMode {
        self.mode.get(m)
    }

    pub fn input(&self, m: &MainCtx) -> u16 {
        self.input.get(m)
    }

    pub fn output(&self, m: &MainCtx) -> u16 {
        self.output.get(m)
    }

    /// Target duty from the external input.
    ///
    /// `level` samples the input pin. It is only called after a capture timeout.
    fn external_target<W: uWrite>(
        &self,
        m: &MainCtx,
        captured: Option<u16>,
        level: impl FnOnce() -> bool,
        log: &mut W,
    ) -> u16 {
        let nr = self.id.number();

        if let Some(duty) = captured {
            self.timeout.set(m, 0);
            Debug::Capture.log_chan_u16(log, nr, duty);
            return duty.min(DUTY_MAX);
        }

        let timeout = self.timeout.get(m).saturating_add(1).min(CAPTURE_TIMEOUT);
        self.timeout.set(m, timeout);
        if timeout < CAPTURE_TIMEOUT {
            return self.input.get(m);
        }

        Debug::Timeout.log_chan_u16(log, nr, timeout as u16);
        match self.dc_level.sample(m, level()) {
            DcLevel::Pending => self.input.get(m),
            DcLevel::Low => {
                Debug::DcLevel.log_chan_str(log, nr, "low");
                0
            }
            DcLevel::High => {
                Debug::DcLevel.log_chan_str(log, nr, "high");
                DUTY_MAX
            }
        }
    }

    /// Run one control cycle.
    ///
    /// Returns the duty that has to be written to the output stage, if any.
    pub fn run<W: uWrite>(
        &self,
        m: &MainCtx,
        captured: Option<u16>,
        level: impl FnOnce() -> bool,
        power: PowerLimit,
        log: &mut W,
    ) -> Option<u16> {
        let nr = self.id.number();
        let band = self.band.get(m);

        if band.is_external() {
            let target = self.external_target(m, captured, level, log);
            let target = self.endpoint.apply(m, &ENDPOINT_PARAMS, target);

            if self.mode.get(m) == ControlMode::Local {
                // Start the filter at the new source.
                self.filter.reset(m, target);
                self.mode.set(m, ControlMode::External);
                Debug::Mode.log_chan_str(log, nr, ControlMode::External.name());
            }

            let input = self.input.get(m);
            if target.abs_diff(input) >= CHANGE_WINDOW {
                let input = self.filter.update(m, true, target, FILTER_DEAD_BAND, FILTER_MAX_ERR);
                self.input.set(m, input);
            }
        } else {
            if self.mode.get(m) != ControlMode::Local {
                self.mode.set(m, ControlMode::Local);
                Debug::Mode.log_chan_str(log, nr, ControlMode::Local.name());
            }
            self.input.set(m, band.duty());
        }

        let output = power.scale(self.input.get(m));
        self.output.set(m, output);
        Debug::Input.log_chan_u16(log, nr, self.input.get(m));
        Debug::Output.log_chan_u16(log, nr, output);

        if output.abs_diff(self.applied.get(m)) >= OUTPUT_THRESHOLD {
            self.applied.set(m, output);
            Some(output)
        } else {
            None
        }
    }
}


// vim: ts=4 sw=4 expandtab
