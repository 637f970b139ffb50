// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! ATmega328P board support.
//!
//! Pin assignment:
//!
//! | Function             | Pin        |
//! |----------------------|------------|
//! | Band select 1        | PC0 / ADC0 |
//! | Band select 2        | PC1 / ADC1 |
//! | Power limit          | PC2 / ADC2 |
//! | External PWM in 1    | PD2 / INT0 |
//! | External PWM in 2    | PD3 / INT1 |
//! | PWM out 1            | PD6 / OC0A |
//! | PWM out 2            | PD5 / OC0B |
//! | Diagnostic UART TX   | PD1 / TXD  |

#![allow(unused_unsafe)]

pub use avr_device::atmega328p as mcu;
pub use avr_device::interrupt;

use avr_atomic::AvrAtomic;
use dimcontrol::{
    DUTY_MAX,
    adc::{AdcChannel, AdcHw},
    capture::{CaptureChannel, CaptureHw, Edge},
    conditioning::ControlChannel,
    context::IrqCtx,
    irq::{GlobalIrq, IRQ_PRIORITIES, IrqId, IrqLines, mask_update, run_preemptible},
    system::DutyOutput,
    timer::Timestamp,
};

use crate::SYSTEM;

/// CPU clock.
pub const FCPU: u32 = 8_000_000;

/// Capture counter prescaler. 1 us per tick.
const TC1_PS: u32 = 8;
const _: () = assert!(FCPU / TC1_PS == 1_000_000);

/// Capture counter ticks per scheduler tick (1 ms).
const TICK_TC1_TICKS: u16 = 1000;

// ADMUX
const REFS0: u8 = 1 << 6;
// ADCSRA
const ADEN: u8 = 1 << 7;
const ADSC: u8 = 1 << 6;
const ADIF: u8 = 1 << 4;
const ADIE: u8 = 1 << 3;
const ADPS_64: u8 = 0b110; // 125 kHz ADC clock.
// EICRA
const ISC00: u8 = 1 << 0;
const ISC10: u8 = 1 << 2;
// EIMSK / EIFR
const EIMSK_IO: u8 = 0x1D;
const INT0_BIT: u8 = 1 << 0;
const INT1_BIT: u8 = 1 << 1;
// TCCR0A
const COM0A1: u8 = 1 << 7;
const COM0B1: u8 = 1 << 5;
const WGM01: u8 = 1 << 1;
const WGM00: u8 = 1 << 0;
// TCCR0B
const CS0_64: u8 = 0b011; // 488 Hz fast PWM.
// TCCR1B
const CS1_8: u8 = 0b010;
// TIMSK1 / TIFR1
const OCIE1A: u8 = 1 << 1;
const OCF1A: u8 = 1 << 1;
// PORTD
const PD2: u8 = 1 << 2;
const PD3: u8 = 1 << 3;
const PD5: u8 = 1 << 5;
const PD6: u8 = 1 << 6;

/// Milliseconds since boot, wrapping.
pub static TICK: AvrAtomic<u8> = AvrAtomic::new();

macro_rules! periph {
    ($name:ident, $periph:ident) => {
        #[inline(always)]
        fn $name() -> mcu::$periph {
            // SAFETY: Single core. Every register bit is owned by exactly one
            //         interrupt source or by the main context. Read-modify-write
            //         of a register is only done by its owner or with the
            //         owning source masked. EIMSK only uses sbi/cbi.
            unsafe { mcu::$periph::steal() }
        }
    };
}

periph!(adc, ADC);
periph!(exint, EXINT);
periph!(portd, PORTD);
periph!(tc0, TC0);
periph!(tc1, TC1);

/// Set or clear one capture enable bit.
///
/// EIMSK is shared by both capture sources, which can interrupt each other's
/// users. Only single instruction bit accesses are used on it.
#[inline(always)]
#[rustfmt::skip]
fn eimsk_write(id: IrqId, enabled: bool) {
    // SAFETY: sbi and cbi atomically modify one bit of EIMSK and nothing else.
    unsafe {
        match (id, enabled) {
            (IrqId::Capture1, true) => {
                core::arch::asm!("sbi {io}, 0", io = const EIMSK_IO, options(nostack, preserves_flags))
            }
            (IrqId::Capture1, false) => {
                core::arch::asm!("cbi {io}, 0", io = const EIMSK_IO, options(nostack, preserves_flags))
            }
            (_, true) => {
                core::arch::asm!("sbi {io}, 1", io = const EIMSK_IO, options(nostack, preserves_flags))
            }
            (_, false) => {
                core::arch::asm!("cbi {io}, 1", io = const EIMSK_IO, options(nostack, preserves_flags))
            }
        }
    }
}

/// The board.
pub struct Hw;

pub static HW: Hw = Hw;

impl Hw {
    fn mask_bits(id: IrqId) -> u8 {
        match id {
            IrqId::Adc => ADIE,
            IrqId::Capture1 => INT0_BIT,
            IrqId::Capture2 => INT1_BIT,
            IrqId::Tick => OCIE1A,
        }
    }

    /// Current capture counter value.
    #[inline(always)]
    pub fn timer_get(&self) -> Timestamp {
        tc1().tcnt1().read().bits().into()
    }
}

impl IrqLines for Hw {
    #[inline(always)]
    fn is_enabled(&self, id: IrqId) -> bool {
        let bits = Self::mask_bits(id);
        let reg = match id {
            IrqId::Adc => adc().adcsra().read().bits(),
            IrqId::Capture1 | IrqId::Capture2 => exint().eimsk().read().bits(),
            IrqId::Tick => tc1().timsk1().read().bits(),
        };
        reg & bits != 0
    }

    #[inline(always)]
    fn set_enabled(&self, id: IrqId, enabled: bool) {
        let bits = Self::mask_bits(id);
        match id {
            // ADIF clears and ADSC starts a conversion when written as one.
            IrqId::Adc => adc()
                .adcsra()
                .modify(|r, w| unsafe { w.bits(mask_update(r.bits(), bits, enabled, ADIF | ADSC)) }),
            IrqId::Capture1 | IrqId::Capture2 => eimsk_write(id, enabled),
            IrqId::Tick => tc1()
                .timsk1()
                .modify(|r, w| unsafe { w.bits(mask_update(r.bits(), bits, enabled, 0)) }),
        }
    }
}

impl GlobalIrq for Hw {
    #[inline(always)]
    unsafe fn enable(&self) {
        // SAFETY: See the safety contract of the trait.
        unsafe { interrupt::enable() };
    }

    #[inline(always)]
    fn disable(&self) {
        interrupt::disable();
    }
}

impl AdcHw for Hw {
    fn start_conversion(&self, chan: AdcChannel) {
        let mux = match chan {
            AdcChannel::BandSelect1 => 0,
            AdcChannel::BandSelect2 => 1,
            AdcChannel::PowerLimit => 2,
        };
        adc().admux().write(|w| unsafe { w.bits(REFS0 | mux) });
        adc()
            .adcsra()
            .modify(|r, w| unsafe { w.bits((r.bits() & !ADIF) | ADSC) });
    }

    fn conversion_result(&self) -> u16 {
        adc().adc().read().bits()
    }
}

impl CaptureHw for Hw {
    #[inline(always)]
    fn input_level(&self, chan: CaptureChannel) -> bool {
        let bit = match chan {
            CaptureChannel::External1 => PD2,
            CaptureChannel::External2 => PD3,
        };
        portd().pind().read().bits() & bit != 0
    }

    fn clear_pending(&self, chan: CaptureChannel) {
        let bit = match chan {
            CaptureChannel::External1 => INT0_BIT,
            CaptureChannel::External2 => INT1_BIT,
        };
        // Flags are cleared by writing a one.
        exint().eifr().write(|w| unsafe { w.bits(bit) });
    }
}

impl DutyOutput for Hw {
    fn set_duty(&self, chan: ControlChannel, duty: u16) {
        let duty = duty.min(DUTY_MAX);
        let ocr = ((duty as u32 * 255 + DUTY_MAX as u32 / 2) / DUTY_MAX as u32) as u8;
        let (com, pin) = match chan {
            ControlChannel::Channel1 => (COM0A1, PD6),
            ControlChannel::Channel2 => (COM0B1, PD5),
        };

        if ocr == 0 {
            // Fast PWM still emits a one-cycle pulse at OCR=0.
            // Disconnect the compare output and drive the pin low.
            tc0().tccr0a().modify(|r, w| unsafe { w.bits(r.bits() & !com) });
            portd().portd().modify(|r, w| unsafe { w.bits(r.bits() & !pin) });
        } else {
            match chan {
                ControlChannel::Channel1 => tc0().ocr0a().write(|w| unsafe { w.bits(ocr) }),
                ControlChannel::Channel2 => tc0().ocr0b().write(|w| unsafe { w.bits(ocr) }),
            }
            tc0().tccr0a().modify(|r, w| unsafe { w.bits(r.bits() | com) });
        }
    }
}

/// Setup of all peripherals used by the control loop.
pub fn hw_init(dp: &mcu::Peripherals) {
    // All sources start masked. The engines enable their own sources.
    for (id, _prio) in IRQ_PRIORITIES {
        HW.set_enabled(id, false);
    }

    // ADC: AVcc reference, single conversions, interrupt driven.
    dp.ADC.admux().write(|w| unsafe { w.bits(REFS0) });
    dp.ADC
        .adcsra()
        .write(|w| unsafe { w.bits(ADEN | ADIF | ADPS_64) });

    // External inputs: interrupt on any logical change.
    dp.EXINT.eicra().write(|w| unsafe { w.bits(ISC00 | ISC10) });
    dp.EXINT.eifr().write(|w| unsafe { w.bits(INT0_BIT | INT1_BIT) });

    // Timer 0: fast PWM outputs, both outputs start disconnected (off).
    dp.TC0.tccr0a().write(|w| unsafe { w.bits(WGM01 | WGM00) });
    dp.TC0.ocr0a().write(|w| unsafe { w.bits(0) });
    dp.TC0.ocr0b().write(|w| unsafe { w.bits(0) });
    dp.TC0.tccr0b().write(|w| unsafe { w.bits(CS0_64) });

    // Timer 1: free running capture counter with 1 ms compare tick.
    dp.TC1.tccr1a().write(|w| unsafe { w.bits(0) });
    dp.TC1.tcnt1().write(|w| unsafe { w.bits(0) });
    dp.TC1.ocr1a().write(|w| unsafe { w.bits(TICK_TC1_TICKS) });
    dp.TC1.tifr1().write(|w| unsafe { w.bits(OCF1A) });
    dp.TC1.tccr1b().write(|w| unsafe { w.bits(CS1_8) });
    HW.set_enabled(IrqId::Tick, true);
}

macro_rules! define_isr {
    ($name:ident, $handler:path) => {
        #[avr_device::interrupt(atmega328p)]
        fn $name() {
            // SAFETY: We are inside of an interrupt handler.
            // Therefore, it is safe to construct an `IrqCtx`.
            let c = unsafe { IrqCtx::new() };
            $handler(&c);
        }
    };
}

define_isr!(ADC, irq_handler_adc);
define_isr!(INT0, irq_handler_int0);
define_isr!(INT1, irq_handler_int1);
define_isr!(TIMER1_COMPA, irq_handler_timer1_compa);

fn irq_handler_adc(c: &IrqCtx) {
    run_preemptible(c, &HW, &HW, IrqId::Adc, |c| {
        SYSTEM.adc().irq_conversion_complete(c, &HW)
    });
}

#[inline(always)]
fn irq_handler_capture(c: &IrqCtx, chan: CaptureChannel) {
    // Sample the edge before anything else can run.
    let stamp = HW.timer_get();
    let edge = if HW.input_level(chan) {
        Edge::Rising
    } else {
        Edge::Falling
    };
    run_preemptible(c, &HW, &HW, chan.irq(), |c| {
        SYSTEM.capture().irq_edge(c, chan, edge, stamp)
    });
}

fn irq_handler_int0(c: &IrqCtx) {
    irq_handler_capture(c, CaptureChannel::External1);
}

fn irq_handler_int1(c: &IrqCtx) {
    irq_handler_capture(c, CaptureChannel::External2);
}

fn irq_handler_timer1_compa(c: &IrqCtx) {
    // The 16 bit compare register shares the TEMP register with the
    // capture counter. Update it before higher priority handlers may run.
    let next = tc1().ocr1a().read().bits().wrapping_add(TICK_TC1_TICKS);
    tc1().ocr1a().write(|w| unsafe { w.bits(next) });

    run_preemptible(c, &HW, &HW, IrqId::Tick, |_c| {
        TICK.store(TICK.load().wrapping_add(1));
        true
    });
}

// vim: ts=4 sw=4 expandtab
