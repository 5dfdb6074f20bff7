//! Extension trait for mixing unsigned amounts with signed deltas.

use alloy::primitives::{I256, U256};

pub trait U256Ext: Sized {
    /// Computes `self - delta` where `delta` may be negative.
    ///
    /// Returns `None` if the result would be negative or overflow.
    fn checked_sub_signed(&self, delta: I256) -> Option<Self>;
}

impl U256Ext for U256 {
    fn checked_sub_signed(&self, delta: I256) -> Option<Self> {
        if delta.is_negative() {
            self.checked_add(delta.unsigned_abs())
        } else {
            self.checked_sub(delta.unsigned_abs())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtracts_signed_deltas() {
        let start = U256::from(100);
        assert_eq!(
            start.checked_sub_signed(I256::try_from(40i64).unwrap()),
            Some(U256::from(60))
        );
        assert_eq!(
            start.checked_sub_signed(I256::try_from(-40i64).unwrap()),
            Some(U256::from(140))
        );
        assert_eq!(start.checked_sub_signed(I256::try_from(101i64).unwrap()), None);
        assert_eq!(U256::MAX.checked_sub_signed(I256::MINUS_ONE), None);
    }
}
