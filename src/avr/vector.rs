//! Overflow handlers shared between the timer drivers and the interrupt
//! vectors.
//!
//! The firmware binds each slot to its vector:
//!
//! ```ignore
//! #[avr_device::interrupt(atmega2560)]
//! fn TIMER1_OVF() {
//!     // SAFETY: We are inside a blocking interrupt.
//!     let cs = unsafe { CriticalSection::new() };
//!     megatimers::avr::vector::TIMER1_OVF.dispatch(cs);
//! }
//! ```

use avr_device::interrupt::{CriticalSection, Mutex};
use core::cell::Cell;

/// Handler slot of one overflow vector.
pub struct OverflowVector {
    handler: Mutex<Cell<Option<fn()>>>,
}

impl OverflowVector {
    pub const fn new() -> Self {
        Self {
            handler: Mutex::new(Cell::new(None)),
        }
    }

    pub fn register(&self, cs: CriticalSection, handler: fn()) {
        self.handler.borrow(cs).set(Some(handler));
    }

    /// Run the registered handler, if any.
    pub fn dispatch(&self, cs: CriticalSection) {
        if let Some(handler) = self.handler.borrow(cs).get() {
            handler();
        }
    }
}

pub static TIMER1_OVF: OverflowVector = OverflowVector::new();

#[cfg(feature = "atmega2560")]
pub static TIMER3_OVF: OverflowVector = OverflowVector::new();

#[cfg(feature = "atmega2560")]
pub static TIMER4_OVF: OverflowVector = OverflowVector::new();

#[cfg(feature = "atmega2560")]
pub static TIMER5_OVF: OverflowVector = OverflowVector::new();
