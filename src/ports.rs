// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(unused_unsafe)]

use crate::hw::mcu;

fn pin_input(_bit: usize) -> u8 {
    0
}
fn pin_output(bit: usize) -> u8 {
    1 << bit
}
fn pin_low(_bit: usize) -> u8 {
    0
}
fn pin_high(bit: usize) -> u8 {
    1 << bit
}
fn pin_floating(_bit: usize) -> u8 {
    0
}
fn pin_pullup(bit: usize) -> u8 {
    1 << bit
}

/// Initial pin configuration.
///
/// Must be called before interrupts are enabled.
#[rustfmt::skip]
pub fn ports_init(dp: &mcu::Peripherals) {
    // SAFETY: Called with interrupts disabled.
    unsafe {
        dp.PORTB.portb().write(|w| {
            w.bits(
                pin_pullup(0) | // NC
                pin_pullup(1) | // NC
                pin_pullup(2) | // NC
                pin_floating(3) | // ISP MOSI
                pin_floating(4) | // ISP MISO
                pin_floating(5) | // ISP SCK
                pin_floating(6) | // XTAL1
                pin_floating(7), // XTAL2
            )
        });
        dp.PORTB.ddrb().write(|w| {
            w.bits(
                pin_input(0) | // NC
                pin_input(1) | // NC
                pin_input(2) | // NC
                pin_input(3) | // ISP MOSI
                pin_input(4) | // ISP MISO
                pin_input(5) | // ISP SCK
                pin_input(6) | // XTAL1
                pin_input(7), // XTAL2
            )
        });

        dp.PORTC.portc().write(|w| {
            w.bits(
                pin_floating(0) | // band select 1, ADC
                pin_floating(1) | // band select 2, ADC
                pin_floating(2) | // power limit, ADC
                pin_pullup(3) | // NC
                pin_pullup(4) | // NC
                pin_pullup(5) | // NC
                pin_floating(6), // RESET
            )
        });
        dp.PORTC.ddrc().write(|w| {
            w.bits(
                pin_input(0) | // band select 1, ADC
                pin_input(1) | // band select 2, ADC
                pin_input(2) | // power limit, ADC
                pin_input(3) | // NC
                pin_input(4) | // NC
                pin_input(5) | // NC
                pin_input(6), // RESET
            )
        });

        dp.PORTD.portd().write(|w| {
            w.bits(
                pin_pullup(0) | // UART RXD, unused
                pin_high(1) | // UART TXD, idle high
                pin_floating(2) | // PWM in 1, INT0
                pin_floating(3) | // PWM in 2, INT1
                pin_pullup(4) | // NC
                pin_low(5) | // PWM out 2, OC0B
                pin_low(6) | // PWM out 1, OC0A
                pin_pullup(7), // NC
            )
        });
        dp.PORTD.ddrd().write(|w| {
            w.bits(
                pin_input(0) | // UART RXD, unused
                pin_output(1) | // UART TXD
                pin_input(2) | // PWM in 1, INT0
                pin_input(3) | // PWM in 2, INT1
                pin_input(4) | // NC
                pin_output(5) | // PWM out 2, OC0B
                pin_output(6) | // PWM out 1, OC0A
                pin_input(7), // NC
            )
        });

        // Disable the digital input buffers of the analog pins.
        dp.ADC.didr0().write(|w| {
            w.bits(
                pin_high(0) | // band select 1
                pin_high(1) | // band select 2
                pin_high(2), // power limit
            )
        });
    }
}

// vim: ts=4 sw=4 expandtab
