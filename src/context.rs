// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Execution context markers and main-context-only storage.

use core::{cell::Cell, marker::PhantomData};

macro_rules! define_context {
    ($name:ident) => {
        pub struct $name(PhantomData<*const ()>);

        impl $name {
            /// Create a new context.
            ///
            /// # SAFETY
            ///
            /// This may only be called from the corresponding context.
            /// `MainCtx` may only be constructed from `main()`
            /// and `IrqCtx` may only be constructed from ISRs.
            #[inline(always)]
            pub unsafe fn new() -> Self {
                fence();
                Self(PhantomData)
            }
        }

        impl Drop for $name {
            #[inline(always)]
            fn drop(&mut self) {
                fence();
            }
        }
    };
}

define_context!(MainCtx);
define_context!(IrqCtx);

/// Optimization and reordering fence.
#[inline(always)]
pub fn fence() {
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}

/// A cell that can only be accessed from the main context.
pub struct MainCtxCell<T> {
    inner: Cell<T>,
}

impl<T> MainCtxCell<T> {
    #[inline]
    pub const fn new(inner: T) -> Self {
        Self {
            inner: Cell::new(inner),
        }
    }
}

impl<T: Copy> MainCtxCell<T> {
    #[inline]
    pub fn get(&self, _m: &MainCtx) -> T {
        self.inner.get()
    }

    #[inline]
    pub fn set(&self, _m: &MainCtx, inner: T) {
        self.inner.set(inner);
    }
}

// SAFETY: All accessors take a `MainCtx`, which can only exist in main() context.
//         Interrupt handlers cannot obtain a `MainCtx`.
//         Therefore, there is never concurrent access to the inner cell.
unsafe impl<T> Sync for MainCtxCell<T> {}

/// Cheaper Option::unwrap() alternative.
///
/// This is cheaper, because it doesn't call into the panic unwind path.
#[inline(always)]
pub fn unwrap_option<T>(value: Option<T>) -> T {
    match value {
        Some(value) => value,
        None => reset_system(),
    }
}

/// Reset the system.
#[inline(always)]
#[allow(clippy::empty_loop)]
pub fn reset_system() -> ! {
    #[cfg(test)]
    panic!("reset_system");

    #[cfg(not(test))]
    loop {
        // Wait for the watchdog timer to trigger and reset the system.
        // No interrupt will reset the watchdog timer.
    }
}



// vim: ts=4 sw=4 expandtab
