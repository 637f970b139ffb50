// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Control core of the two channel PWM dimmer.
//!
//! Everything in here is independent of the microcontroller.
//! The board specific parts live in the firmware binary.

#![cfg_attr(not(test), no_std)]

pub mod adc;
pub mod capture;
pub mod conditioning;
pub mod context;
pub mod debounce;
pub mod debug;
pub mod endpoint;
pub mod filter;
pub mod irq;
pub mod switch;
pub mod system;
pub mod timer;

#[cfg(test)]
mod testhw;

/// Full scale duty cycle, in permille.
pub const DUTY_MAX: u16 = 1000;

// vim: ts=4 sw=4 expandtab
