// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transmit-only USART0 for the diagnostic log.

#![allow(unused_unsafe)]

use crate::hw::{FCPU, mcu};
use core::convert::Infallible;
use ufmt::uWrite;

const BAUD: u32 = 38_400;
// Double speed mode.
const UBRR: u16 = (FCPU / (8 * BAUD) - 1) as u16;

// UCSR0A
const UDRE0: u8 = 1 << 5;
const U2X0: u8 = 1 << 1;
// UCSR0B
const TXEN0: u8 = 1 << 3;
// UCSR0C
const UCSZ01: u8 = 1 << 2;
const UCSZ00: u8 = 1 << 1;

#[inline(always)]
fn usart() -> mcu::USART0 {
    // SAFETY: USART0 is only used by the main context.
    unsafe { mcu::USART0::steal() }
}

pub fn uart_init(dp: &mcu::Peripherals) {
    // SAFETY: Called with interrupts disabled.
    unsafe {
        dp.USART0.ubrr0().write(|w| w.bits(UBRR));
        dp.USART0.ucsr0a().write(|w| w.bits(U2X0));
        dp.USART0.ucsr0c().write(|w| w.bits(UCSZ01 | UCSZ00)); // 8N1
        dp.USART0.ucsr0b().write(|w| w.bits(TXEN0));
    }
}

fn uart_tx(data: u8) {
    while usart().ucsr0a().read().bits() & UDRE0 == 0 {
        // Wait for the previous byte to leave the data register.
    }
    // SAFETY: Any value is a valid data byte.
    usart().udr0().write(|w| unsafe { w.bits(data) });
}

/// Log sink on USART0.
pub struct UartLog;

impl uWrite for UartLog {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        for b in s.bytes() {
            if b == b'\n' {
                uart_tx(b'\r');
            }
            uart_tx(b);
        }
        Ok(())
    }
}

// vim: ts=4 sw=4 expandtab
