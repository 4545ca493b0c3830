//! Per-frame gas meter

use crate::error::ExceptionalHalt;
use tracing::trace;

/// Remaining gas and accumulated refund of one call frame.
///
/// The refund counter is inherited from the parent frame at entry and handed
/// back in the frame result; it is only capped at transaction settlement,
/// which happens outside the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasMeter {
    limit: u64,
    left: u64,
    refund: u64,
}

impl GasMeter {
    /// Meter with `limit` gas and an inherited refund counter
    pub fn new(limit: u64, refund: u64) -> Self {
        Self {
            limit,
            left: limit,
            refund,
        }
    }

    /// Gas the frame started with
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Gas left
    #[inline]
    pub fn left(&self) -> u64 {
        self.left
    }

    /// Gas spent so far
    pub fn spent(&self) -> u64 {
        self.limit - self.left
    }

    /// Refund counter
    pub fn refund(&self) -> u64 {
        self.refund
    }

    /// Charge `amount`. On failure nothing is left.
    #[inline]
    pub fn use_gas(&mut self, amount: u64, reason: &'static str) -> Result<(), ExceptionalHalt> {
        match self.left.checked_sub(amount) {
            Some(left) => {
                self.left = left;
                Ok(())
            }
            None => {
                trace!(reason, amount, left = self.left, "out of gas");
                self.left = 0;
                Err(ExceptionalHalt::OutOfGas)
            }
        }
    }

    /// Give back gas a sub-call did not use
    pub fn return_gas(&mut self, amount: u64) {
        self.left = self.left.saturating_add(amount).min(self.limit);
    }

    /// Consume everything that is left
    pub fn exhaust(&mut self) {
        self.left = 0;
    }

    /// Add to the refund counter
    pub fn refund_gas(&mut self, amount: u64) {
        self.refund = self.refund.saturating_add(amount);
    }

    /// Take from the refund counter, clamping at zero
    pub fn sub_refund(&mut self, amount: u64) -> Result<(), ExceptionalHalt> {
        match self.refund.checked_sub(amount) {
            Some(refund) => {
                self.refund = refund;
                Ok(())
            }
            None => {
                self.refund = 0;
                Err(ExceptionalHalt::RefundExhausted)
            }
        }
    }

    /// Replace the refund counter with the one a successful child ended with
    pub fn adopt_refund(&mut self, refund: u64) {
        self.refund = refund;
    }
}
