use alloy::primitives::{U256, U512};

/// Direction the quotient of [`mul_div`] is rounded in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// Computes `x * q / d` without intermediate overflow.
///
/// Returns `None` if `d` is `0` or if the result overflows a 256-bit integer.
pub fn mul_div(x: U256, q: U256, d: U256, rounding: Rounding) -> Option<U256> {
    if d.is_zero() {
        return None;
    }

    let (quotient, inexact) = match x.checked_mul(q) {
        Some(p) => (p / d, !(p % d).is_zero()),
        None => {
            let p = U512::from(x) * U512::from(q);
            let d = U512::from(d);
            (narrow(p / d)?, !(p % d).is_zero())
        }
    };
    match rounding {
        Rounding::Down => Some(quotient),
        Rounding::Up if inexact => quotient.checked_add(U256::ONE),
        Rounding::Up => Some(quotient),
    }
}

/// Solidity's `mulDivDown`.
pub fn mul_ratio(x: U256, q: U256, d: U256) -> Option<U256> {
    mul_div(x, q, d, Rounding::Down)
}

/// Solidity's `mulDivUp`.
pub fn mul_ratio_ceil(x: U256, q: U256, d: U256) -> Option<U256> {
    mul_div(x, q, d, Rounding::Up)
}

fn narrow(value: U512) -> Option<U256> {
    let limbs = value.into_limbs();
    if limbs[4..].iter().any(|limb| *limb != 0) {
        return None;
    }
    Some(U256::from_limbs_slice(&limbs[..4]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_in_opposite_directions() {
        let (x, q, d) = (U256::from(25), U256::from(5), U256::from(10));
        assert_eq!(mul_ratio(x, q, d), Some(U256::from(12)));
        assert_eq!(mul_ratio_ceil(x, q, d), Some(U256::from(13)));
    }

    #[test]
    fn exact_division_does_not_round_up() {
        let (x, q, d) = (U256::from(40), U256::from(2), U256::from(4));
        assert_eq!(mul_div(x, q, d, Rounding::Down), Some(U256::from(20)));
        assert_eq!(mul_div(x, q, d, Rounding::Up), Some(U256::from(20)));
    }

    #[test]
    fn zero_denominator() {
        assert_eq!(mul_ratio(U256::from(1), U256::from(1), U256::ZERO), None);
        assert_eq!(mul_ratio_ceil(U256::from(1), U256::from(1), U256::ZERO), None);
    }

    #[test]
    fn intermediate_overflow_is_handled() {
        // MAX * 3 overflows 256 bits but the final result fits
        assert_eq!(
            mul_ratio(U256::MAX, U256::from(3), U256::from(4)),
            Some(U256::MAX / U256::from(4) * U256::from(3) + U256::from(2))
        );
        assert_eq!(
            mul_ratio_ceil(U256::MAX, U256::from(3), U256::from(4)),
            Some(U256::MAX / U256::from(4) * U256::from(3) + U256::from(3))
        );
        assert_eq!(mul_ratio(U256::MAX, U256::from(2), U256::from(1)), None);
        assert_eq!(
            mul_ratio_ceil(U256::MAX, U256::from(2), U256::from(2)),
            Some(U256::MAX)
        );
    }
}
