// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interrupt driven, averaging ADC acquisition.
//!
//! One batch converts all channels round robin for [ADC_ROUNDS] rounds.
//! The averages are published when the batch is complete.

use crate::{
    context::{IrqCtx, MainCtx},
    irq::{IrqId, IrqLines, IrqShared},
};

/// Number of samples per channel in one batch.
pub const ADC_ROUNDS: usize = 4;
const ADC_ROUNDS_SHIFT: u32 = 2;
const _: () = assert!(1 << ADC_ROUNDS_SHIFT == ADC_ROUNDS);

/// Valid bits of a conversion result.
pub const ADC_RESULT_MASK: u16 = 0x3FF;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum AdcChannel {
    BandSelect1,
    BandSelect2,
    PowerLimit,
}

impl AdcChannel {
    pub const COUNT: usize = 3;

    pub const fn from_index(index: usize) -> Self {
        match index {
            0 => Self::BandSelect1,
            1 => Self::BandSelect2,
            _ => Self::PowerLimit,
        }
    }
}

pub trait AdcHw: IrqLines {
    /// Select the channel and start a single conversion.
    fn start_conversion(&self, chan: AdcChannel);

    /// Raw result of the last conversion.
    fn conversion_result(&self) -> u16;
}

struct Batch {
    samples: [[u16; AdcChannel::COUNT]; ADC_ROUNDS],
    round: u8,
    chan: u8,
    running: bool,
    result: Option<[u16; AdcChannel::COUNT]>,
}

impl Batch {
    const fn new() -> Self {
        Self {
            samples: [[0; AdcChannel::COUNT]; ADC_ROUNDS],
            round: 0,
            chan: 0,
            running: false,
            result: None,
        }
    }

    fn averages(&self) -> [u16; AdcChannel::COUNT] {
        let mut ave = [0; AdcChannel::COUNT];
        for (chan, ave) in ave.iter_mut().enumerate() {
            let sum: u16 = self.samples.iter().map(|round| round[chan]).sum();
            *ave = sum >> ADC_ROUNDS_SHIFT;
        }
        ave
    }
}

pub struct Adc {
    batch: IrqShared<Batch>,
}

impl Adc {
    pub const fn new() -> Self {
        Self {
            batch: IrqShared::new(Batch::new()),
        }
    }

    /// Start a new batch.
    ///
    /// A running batch is only restarted, if `force` is set.
    /// Returns true, if a new batch has been started.
    pub fn start(&self, m: &MainCtx, hw: &impl AdcHw, force: bool) -> bool {
        let started = self.batch.lock(m, hw, IrqId::Adc, |b| {
            if b.running && !force {
                return false;
            }
            b.samples = [[0; AdcChannel::COUNT]; ADC_ROUNDS];
            b.round = 0;
            b.chan = 0;
            b.running = true;
            hw.start_conversion(AdcChannel::BandSelect1);
            true
        });
        if started {
            hw.set_enabled(IrqId::Adc, true);
        }
        started
    }

    /// Get the averaged raw value of a channel.
    ///
    /// Returns None while a batch is running or before the first batch completed.
    pub fn get(&self, m: &MainCtx, hw: &impl AdcHw, chan: AdcChannel) -> Option<u16> {
        self.batch.lock(m, hw, IrqId::Adc, |b| {
            if b.running {
                None
            } else {
                b.result.map(|result| result[chan as usize])
            }
        })
    }

    pub fn is_running(&self, m: &MainCtx, hw: &impl AdcHw) -> bool {
        self.batch.lock(m, hw, IrqId::Adc, |b| b.running)
    }

    /// Conversion complete interrupt.
    ///
    /// Returns the new enable state of the interrupt.
    pub fn irq_conversion_complete(&self, c: &IrqCtx, hw: &impl AdcHw) -> bool {
        self.batch.irq(c, |b| {
            if !b.running {
                return false;
            }

            let round = b.round as usize;
            let chan = b.chan as usize;
            b.samples[round][chan] = hw.conversion_result() & ADC_RESULT_MASK;

            let mut chan = chan + 1;
            let mut round = round;
            if chan >= AdcChannel::COUNT {
                chan = 0;
                round += 1;
            }
            b.chan = chan as u8;
            b.round = round as u8;

            if round >= ADC_ROUNDS {
                b.result = Some(b.averages());
                b.running = false;
                false
            } else {
                hw.start_conversion(AdcChannel::from_index(chan));
                true
            }
        })
    }
}

impl Default for Adc {
    fn default() -> Self {
        Self::new()
    }
}


// vim: ts=4 sw=4 expandtab
