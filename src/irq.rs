// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interrupt sources, their priorities and interrupt-shared state.
//!
//! Shared state is never protected by a global interrupt disable.
//! Instead the main context masks only the one source that shares the state
//! with it ("narrow critical section").

use crate::context::{IrqCtx, MainCtx, reset_system};
use core::cell::{Cell, UnsafeCell};

/// The interrupt sources of the system.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum IrqId {
    /// ADC conversion complete.
    Adc,
    /// Edge on external PWM input 1.
    Capture1,
    /// Edge on external PWM input 2.
    Capture2,
    /// 1 ms scheduler tick.
    Tick,
}

impl IrqId {
    pub const COUNT: usize = 4;
    pub const ALL: [IrqId; Self::COUNT] = [Self::Adc, Self::Capture1, Self::Capture2, Self::Tick];

    /// Look up the priority of this source in [IRQ_PRIORITIES].
    pub fn priority(self) -> IrqPriority {
        for (id, prio) in IRQ_PRIORITIES {
            if id == self {
                return prio;
            }
        }
        IrqPriority::Lowest
    }

    /// Returns true, if `self` may interrupt a running handler of `other`.
    pub fn preempts(self, other: IrqId) -> bool {
        self.priority() > other.priority()
    }

    /// Returns true, if any other source may interrupt a handler of `self`.
    pub fn is_preemptible(self) -> bool {
        Self::ALL.iter().any(|id| id.preempts(self))
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum IrqPriority {
    Lowest,
    Low,
    High,
    Highest,
}

/// Static interrupt priority assignment.
///
/// The diagnostic UART is polled and has no entry.
pub const IRQ_PRIORITIES: [(IrqId, IrqPriority); IrqId::COUNT] = [
    (IrqId::Adc, IrqPriority::Highest),
    (IrqId::Capture1, IrqPriority::High),
    (IrqId::Capture2, IrqPriority::High),
    (IrqId::Tick, IrqPriority::Low),
];

/// Per-source interrupt enable control.
pub trait IrqLines {
    fn is_enabled(&self, id: IrqId) -> bool;
    fn set_enabled(&self, id: IrqId, enabled: bool);
}

/// New value of an interrupt control register with the enable `bits` changed.
///
/// `strobe` are bits that trigger an action when written as one.
/// They are always written as zero.
#[inline(always)]
pub const fn mask_update(reg: u8, bits: u8, enabled: bool, strobe: u8) -> u8 {
    let reg = if enabled { reg | bits } else { reg & !bits };
    reg & !strobe
}

/// Global interrupt enable control.
pub trait GlobalIrq {
    /// Globally enable interrupts.
    ///
    /// # SAFETY
    ///
    /// All interrupt-shared state that the caller holds must be in a
    /// consistent state and the caller's own source must be masked.
    unsafe fn enable(&self);

    /// Globally disable interrupts.
    fn disable(&self);
}

/// Run `f` with only the interrupt source `id` masked.
///
/// The previous enable state of the source is restored afterwards.
#[inline]
pub fn with_masked<L: IrqLines, R>(lines: &L, id: IrqId, f: impl FnOnce() -> R) -> R {
    let saved = lines.is_enabled(id);
    lines.set_enabled(id, false);
    let ret = f();
    lines.set_enabled(id, saved);
    ret
}

/// Run an interrupt handler body so that sources with a higher
/// priority can interrupt it.
///
/// All sources at or below the priority of `own` are masked while the body
/// runs with interrupts globally enabled. Afterwards they are restored.
/// The body returns the new enable state of `own`.
///
/// Sources without a higher priority peer run their body directly.
pub fn run_preemptible<L: IrqLines, G: GlobalIrq>(
    c: &IrqCtx,
    lines: &L,
    global: &G,
    own: IrqId,
    f: impl FnOnce(&IrqCtx) -> bool,
) {
    if !own.is_preemptible() {
        let rearm = f(c);
        lines.set_enabled(own, rearm);
        return;
    }

    let prio = own.priority();
    let mut saved = [false; IrqId::COUNT];
    for id in IrqId::ALL {
        if id.priority() <= prio {
            saved[id as usize] = lines.is_enabled(id);
            lines.set_enabled(id, false);
        }
    }

    // SAFETY: Our own source and all peers of the same or lower priority are masked.
    //         Only handlers of higher priority can run, and they don't share state with us.
    unsafe { global.enable() };
    let rearm = f(c);
    global.disable();

    for id in IrqId::ALL {
        if id == own {
            lines.set_enabled(id, rearm);
        } else if id.priority() <= prio {
            lines.set_enabled(id, saved[id as usize]);
        }
    }
}

/// State that is shared between the main context and exactly one interrupt source.
pub struct IrqShared<T> {
    inner: UnsafeCell<T>,
    busy: Cell<bool>,
}

impl<T> IrqShared<T> {
    pub const fn new(inner: T) -> Self {
        Self {
            inner: UnsafeCell::new(inner),
            busy: Cell::new(false),
        }
    }

    #[inline(always)]
    fn access<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        if self.busy.replace(true) {
            // Nested access.
            reset_system();
        }
        // SAFETY: The busy flag guarantees that there is no other reference.
        let ret = f(unsafe { &mut *self.inner.get() });
        self.busy.set(false);
        ret
    }

    /// Access the state from main context.
    ///
    /// The interrupt source `id` that owns this state is masked during `f`.
    #[inline]
    pub fn lock<L: IrqLines, R>(
        &self,
        _m: &MainCtx,
        lines: &L,
        id: IrqId,
        f: impl FnOnce(&mut T) -> R,
    ) -> R {
        with_masked(lines, id, || self.access(f))
    }

    /// Access the state from the owning interrupt handler.
    #[inline]
    pub fn irq<R>(&self, _c: &IrqCtx, f: impl FnOnce(&mut T) -> R) -> R {
        self.access(f)
    }
}

// SAFETY: The main context accesses the state only with the owning interrupt
//         source masked. The owning handler cannot be re-entered, because
//         `run_preemptible` masks it. A nested access resets the system.
unsafe impl<T: Send> Sync for IrqShared<T> {}


// vim: ts=4 sw=4 expandtab
