//! # IRQ flags
//! Events captured in interrupt context and handled by the main loop.
//!
//! An interrupt handler only raises the flag. The scheduler takes it once per
//! tick and does the actual work outside the interrupt.

use portable_atomic::{AtomicBool, Ordering};

/// Flag raised by an interrupt handler and consumed by the main loop
pub struct IrqFlag(AtomicBool);

impl IrqFlag {
    /// Create a lowered flag, usable in a `static`
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Raise the flag, safe to call from an interrupt handler
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Lower the flag, returning whether it was raised
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Whether the flag is raised, without consuming it
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for IrqFlag {
    fn default() -> Self {
        Self::new()
    }
}
