// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two channel PWM dimmer firmware for ATmega328P.
//!
//! The modules declared here belong to the firmware binary only.
//! The control core is the `dimcontrol` library.

#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]
#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch))]

#[cfg(target_arch = "avr")]
mod hw;
#[cfg(target_arch = "avr")]
mod ports;
#[cfg(all(target_arch = "avr", feature = "debug"))]
mod uart;

#[cfg(target_arch = "avr")]
mod firmware {
    use crate::{
        hw::{HW, TICK, hw_init, interrupt, mcu},
        ports::ports_init,
    };
    use dimcontrol::{
        context::{MainCtx, reset_system, unwrap_option},
        debug::NoLog,
        system::{CONTROL_PERIOD_MS, System},
    };

    pub static SYSTEM: System = System::new();

    /// Only every n-th control cycle is logged.
    #[cfg(feature = "debug")]
    const DIAG_DIVIDER: u8 = 200;

    fn wdt_init() {
        // SAFETY: The asm code only accesses the WDT and MCUSR registers
        //         which are not accessed from anywhere else in the program.
        unsafe {
            // Enable WDT with timeout 250 ms
            core::arch::asm!(
                "wdr",
                "ldi {tmp}, 0",
                "out {MCUSR}, {tmp}", // WDRF=0, otherwise WDE can't be changed.
                "ldi {tmp}, 0x18", // WDCE=1, WDE=1
                "sts {WDTCSR}, {tmp}",
                "ldi {tmp}, 0x0C", // WDE=1, WDP2=1, WDP1=0, WDP0=0
                "sts {WDTCSR}, {tmp}",
                tmp = out(reg_upper) _,
                MCUSR = const 0x34,
                WDTCSR = const 0x60,
                options(nostack, preserves_flags)
            );
        }
    }

    fn wdt_poke(_wp: &mcu::WDT) {
        avr_device::asm::wdr();
    }

    #[allow(unused_variables)]
    fn control(m: &MainCtx, diag_count: &mut u8) {
        #[cfg(feature = "debug")]
        {
            *diag_count += 1;
            if *diag_count >= DIAG_DIVIDER {
                *diag_count = 0;
                SYSTEM.run(m, &HW, &mut crate::uart::UartLog);
                return;
            }
        }
        SYSTEM.run(m, &HW, &mut NoLog);
    }

    #[avr_device::entry]
    fn main() -> ! {
        wdt_init();

        let dp = unwrap_option(mcu::Peripherals::take());

        ports_init(&dp);
        hw_init(&dp);
        #[cfg(feature = "debug")]
        crate::uart::uart_init(&dp);

        // SAFETY:
        // This is the context handle for the main() function.
        // Holding a reference to this object proves that the holder
        // is running in main() context.
        let m = unsafe { MainCtx::new() };

        SYSTEM.init(&m, &HW);

        // SAFETY: This must be after construction of MainCtx
        //         and after the engines have been initialized.
        unsafe { interrupt::enable() };

        let mut next = TICK.load();
        let mut diag_count = 0;
        loop {
            let now = TICK.load();
            let late = now.wrapping_sub(next);
            if late < 0x80 {
                next = if late >= CONTROL_PERIOD_MS {
                    // Missed a whole period. Don't try to catch up.
                    now.wrapping_add(CONTROL_PERIOD_MS)
                } else {
                    next.wrapping_add(CONTROL_PERIOD_MS)
                };
                control(&m, &mut diag_count);
            }
            wdt_poke(&dp.WDT);
        }
    }

    #[panic_handler]
    fn panic(_: &core::panic::PanicInfo) -> ! {
        reset_system();
    }
}

#[cfg(target_arch = "avr")]
use firmware::SYSTEM;

/// The firmware only runs on the microcontroller.
#[cfg(not(target_arch = "avr"))]
fn main() {
    eprintln!("dimcontrol: This is AVR firmware. Build it for the avr target.");
}

// vim: ts=4 sw=4 expandtab
