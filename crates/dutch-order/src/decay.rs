//! Piecewise linear decay curves.
//!
//! All arithmetic mirrors the settlement contract: decreasing amounts round
//! the decayed delta down and increasing amounts round it up, so a quote
//! computed here never disagrees with on-chain settlement by a unit at a
//! curve boundary.

use {
    alloy::primitives::{I256, U256},
    number::{
        math::{mul_ratio, mul_ratio_ceil},
        serialization::DecimalI256,
        u256_ext::U256Ext,
    },
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
};

/// The settlement contract refuses curves with more checkpoints than this.
pub const MAX_CURVE_POINTS: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    #[error("curve has {len} points, at most {MAX_CURVE_POINTS} are allowed")]
    TooManyPoints { len: usize },
    #[error("curve has {blocks} relative blocks but {amounts} relative amounts")]
    LengthMismatch { blocks: usize, amounts: usize },
    #[error("relative block at index {index} is not strictly increasing")]
    NotIncreasing { index: usize },
    #[error("curve amount is negative")]
    Underflow,
    #[error("curve amount overflows 256 bits")]
    Overflow,
}

/// Checkpoints `(relative_blocks[i], relative_amounts[i])` of a piecewise
/// linear curve. A relative amount is the signed delta subtracted from the
/// start amount once `relative_blocks[i]` blocks have passed since the decay
/// start block. The origin `(0, 0)` is implicit.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayCurve {
    pub relative_blocks: Vec<u16>,
    #[serde_as(as = "Vec<DecimalI256>")]
    pub relative_amounts: Vec<I256>,
}

impl DecayCurve {
    pub fn new(relative_blocks: Vec<u16>, relative_amounts: Vec<I256>) -> Self {
        Self {
            relative_blocks,
            relative_amounts,
        }
    }

    /// A curve that never decays.
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.relative_blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relative_blocks.is_empty()
    }

    /// Checks the structural invariants of the curve: at most
    /// [`MAX_CURVE_POINTS`] checkpoints, as many amounts as blocks and
    /// relative blocks strictly increasing away from the implicit origin.
    ///
    /// The origin is block `0`, so a curve whose first relative block is `0`
    /// fails with [`CurveError::NotIncreasing`] at index `0`. The packed
    /// layout uses a zero field as its terminator.
    pub fn validate(&self) -> Result<(), CurveError> {
        if self.relative_blocks.len() > MAX_CURVE_POINTS {
            return Err(CurveError::TooManyPoints {
                len: self.relative_blocks.len(),
            });
        }
        if self.relative_blocks.len() != self.relative_amounts.len() {
            return Err(CurveError::LengthMismatch {
                blocks: self.relative_blocks.len(),
                amounts: self.relative_amounts.len(),
            });
        }
        let mut previous = 0;
        for (index, block) in self.relative_blocks.iter().copied().enumerate() {
            if block <= previous {
                return Err(CurveError::NotIncreasing { index });
            }
            previous = block;
        }
        Ok(())
    }

    /// The amount at every checkpoint for the given start amount.
    pub fn checkpoint_amounts(&self, start_amount: U256) -> Result<Vec<U256>, CurveError> {
        self.relative_amounts
            .iter()
            .map(|relative| apply(start_amount, *relative))
            .collect()
    }

    /// The amount once the curve is fully decayed.
    pub fn end_amount(&self, start_amount: U256) -> Result<U256, CurveError> {
        get_end_amount(start_amount, &self.relative_amounts)
    }
}

/// Evaluates `curve` at `current_block` for an amount that starts decaying at
/// `decay_start_block`.
pub fn decay(
    curve: &DecayCurve,
    start_amount: U256,
    decay_start_block: u64,
    current_block: u64,
) -> Result<U256, CurveError> {
    if curve.relative_amounts.len() > MAX_CURVE_POINTS {
        return Err(CurveError::TooManyPoints {
            len: curve.relative_amounts.len(),
        });
    }
    if curve.relative_blocks.len() != curve.relative_amounts.len() {
        return Err(CurveError::LengthMismatch {
            blocks: curve.relative_blocks.len(),
            amounts: curve.relative_amounts.len(),
        });
    }
    if curve.is_empty() || current_block <= decay_start_block {
        return Ok(start_amount);
    }

    let block_delta = current_block - decay_start_block;
    let bracket = Bracket::locate(curve, block_delta);
    let last_amount = apply(start_amount, bracket.start_amount)?;
    let next_amount = apply(start_amount, bracket.end_amount)?;
    Ok(linear_decay(
        bracket.start_point,
        bracket.end_point,
        block_delta,
        last_amount,
        next_amount,
    ))
}

/// The terminal value of a curve: `start_amount - relative_amounts[last]`.
pub fn get_end_amount(start_amount: U256, relative_amounts: &[I256]) -> Result<U256, CurveError> {
    match relative_amounts.last() {
        Some(relative) => apply(start_amount, *relative),
        None => Ok(start_amount),
    }
}

/// Interpolates between `(start_point, start_amount)` and
/// `(end_point, end_amount)` at `current_point`.
///
/// Decreasing amounts round the decayed delta down and increasing amounts
/// round it up, e.g. halfway from 100 to 75 is 88 and halfway from 100 to 125
/// is 113.
pub fn linear_decay(
    start_point: u64,
    end_point: u64,
    current_point: u64,
    start_amount: U256,
    end_amount: U256,
) -> U256 {
    if current_point >= end_point {
        return end_amount;
    }
    if current_point <= start_point {
        return start_amount;
    }

    let elapsed = U256::from(current_point - start_point);
    let duration = U256::from(end_point - start_point);
    // `duration` is non-zero past the guards above and the rounded delta never
    // exceeds the distance between the two amounts.
    if end_amount < start_amount {
        let distance = start_amount - end_amount;
        let delta = mul_ratio(distance, elapsed, duration).unwrap_or(distance);
        start_amount - delta
    } else {
        let distance = end_amount - start_amount;
        let delta = mul_ratio_ceil(distance, elapsed, duration).unwrap_or(distance);
        start_amount + delta
    }
}

/// Decay of a legacy two-point amount between two timestamps.
pub fn linear_time_decay(
    start_amount: U256,
    end_amount: U256,
    decay_start_time: u64,
    decay_end_time: u64,
    timestamp: u64,
) -> U256 {
    if start_amount == end_amount {
        return start_amount;
    }
    if decay_end_time <= timestamp {
        return end_amount;
    }
    if decay_start_time >= timestamp {
        return start_amount;
    }
    linear_decay(
        decay_start_time,
        decay_end_time,
        timestamp,
        start_amount,
        end_amount,
    )
}

fn apply(start_amount: U256, relative: I256) -> Result<U256, CurveError> {
    start_amount
        .checked_sub_signed(relative)
        .ok_or(if relative.is_negative() {
            CurveError::Overflow
        } else {
            CurveError::Underflow
        })
}

/// The two checkpoints surrounding a block delta.
#[derive(Debug, PartialEq, Eq)]
struct Bracket {
    start_point: u64,
    end_point: u64,
    start_amount: I256,
    end_amount: I256,
}

impl Bracket {
    /// Expects a non-empty curve with matching lengths.
    fn locate(curve: &DecayCurve, block_delta: u64) -> Self {
        let blocks = &curve.relative_blocks;
        let amounts = &curve.relative_amounts;

        let mut start_point = 0;
        let mut start_amount = I256::ZERO;
        for (block, amount) in blocks.iter().copied().zip(amounts.iter().copied()) {
            let block = u64::from(block);
            if block_delta < block {
                return Self {
                    start_point,
                    end_point: block,
                    start_amount,
                    end_amount: amount,
                };
            }
            start_point = block;
            start_amount = amount;
        }

        // At or past the last checkpoint both ends collapse onto it.
        Self {
            start_point,
            end_point: start_point,
            start_amount,
            end_amount: start_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(value: i64) -> I256 {
        I256::try_from(value).unwrap()
    }

    fn curve(blocks: &[u16], amounts: &[i64]) -> DecayCurve {
        DecayCurve::new(blocks.to_vec(), amounts.iter().copied().map(int).collect())
    }

    #[test]
    fn single_point_decreasing() {
        let curve = curve(&[4], &[40]);
        assert_eq!(decay(&curve, U256::from(100), 0, 2), Ok(U256::from(80)));
    }

    #[test]
    fn single_point_increasing() {
        let curve = curve(&[4], &[-40]);
        assert_eq!(decay(&curve, U256::from(100), 0, 2), Ok(U256::from(120)));
    }

    #[test]
    fn multi_point_curve() {
        let curve = curve(&[4, 6], &[40, 20]);
        let start = U256::from(100);
        assert_eq!(decay(&curve, start, 0, 4), Ok(U256::from(60)));
        assert_eq!(decay(&curve, start, 0, 5), Ok(U256::from(70)));
        assert_eq!(decay(&curve, start, 0, 6), Ok(U256::from(80)));
    }

    #[test]
    fn no_decay_before_start() {
        let curve = curve(&[4, 6], &[40, 20]);
        let start = U256::from(100);
        for block in 0..=10 {
            assert_eq!(decay(&curve, start, 10, block), Ok(start));
        }
    }

    #[test]
    fn fully_decayed_after_last_point() {
        let curve = curve(&[4, 6, 10], &[40, 20, 50]);
        let start = U256::from(100);
        let end = curve.end_amount(start).unwrap();
        assert_eq!(end, U256::from(50));
        for block in 1010..1020 {
            assert_eq!(decay(&curve, start, 1000, block), Ok(end));
        }
    }

    #[test]
    fn empty_curve_never_decays() {
        let start = U256::from(100);
        assert_eq!(decay(&DecayCurve::flat(), start, 0, 1_000), Ok(start));
        assert_eq!(get_end_amount(start, &[]), Ok(start));
    }

    #[test]
    fn decay_is_anchored_at_start_block() {
        let curve = curve(&[10], &[100]);
        let start = U256::from(1_000);
        assert_eq!(decay(&curve, start, 50, 55), Ok(U256::from(950)));
        assert_eq!(decay(&curve, start, 50, 53), Ok(U256::from(970)));
    }

    #[test]
    fn rounding_direction() {
        let start = U256::from(100);
        // decreasing rounds the delta down: 100 - floor(12.5)
        assert_eq!(linear_decay(0, 10, 5, start, U256::from(75)), U256::from(88));
        // increasing rounds the delta up: 100 + ceil(12.5)
        assert_eq!(linear_decay(0, 10, 5, start, U256::from(125)), U256::from(113));
    }

    #[test]
    fn linear_decay_bounds() {
        let (start, end) = (U256::from(100), U256::from(50));
        assert_eq!(linear_decay(0, 10, 10, start, end), end);
        assert_eq!(linear_decay(0, 10, 11, start, end), end);
        assert_eq!(linear_decay(5, 10, 5, start, end), start);
        assert_eq!(linear_decay(5, 10, 3, start, end), start);
    }

    #[test]
    fn rounding_at_curve_boundaries() {
        // 1 unit over 3 blocks
        let decreasing = curve(&[3], &[1]);
        let increasing = curve(&[3], &[-1]);
        let start = U256::from(10);
        assert_eq!(decay(&decreasing, start, 0, 1), Ok(U256::from(10)));
        assert_eq!(decay(&decreasing, start, 0, 2), Ok(U256::from(10)));
        assert_eq!(decay(&decreasing, start, 0, 3), Ok(U256::from(9)));
        assert_eq!(decay(&increasing, start, 0, 1), Ok(U256::from(11)));
        assert_eq!(decay(&increasing, start, 0, 3), Ok(U256::from(11)));
    }

    #[test]
    fn too_many_points() {
        let blocks = (1..=17).collect::<Vec<u16>>();
        let amounts = vec![int(1); 17];
        let curve = DecayCurve::new(blocks, amounts);
        assert_eq!(
            decay(&curve, U256::from(100), 0, 5),
            Err(CurveError::TooManyPoints { len: 17 })
        );
        assert_eq!(curve.validate(), Err(CurveError::TooManyPoints { len: 17 }));
    }

    #[test]
    fn validate_rejects_malformed_curves() {
        assert_eq!(
            curve(&[1, 2, 1], &[1, 2, 3]).validate(),
            Err(CurveError::NotIncreasing { index: 2 })
        );
        assert_eq!(
            curve(&[1, 1], &[1, 2]).validate(),
            Err(CurveError::NotIncreasing { index: 1 })
        );
        assert_eq!(
            curve(&[0, 1], &[1, 2]).validate(),
            Err(CurveError::NotIncreasing { index: 0 })
        );
        assert_eq!(
            curve(&[1, 2], &[1]).validate(),
            Err(CurveError::LengthMismatch {
                blocks: 2,
                amounts: 1
            })
        );
        assert_eq!(curve(&[1, 2, 3], &[1, -2, 3]).validate(), Ok(()));
        assert_eq!(DecayCurve::flat().validate(), Ok(()));
    }

    #[test]
    fn amounts_out_of_range() {
        assert_eq!(
            curve(&[4], &[101]).end_amount(U256::from(100)),
            Err(CurveError::Underflow)
        );
        assert_eq!(
            curve(&[4], &[-1]).end_amount(U256::MAX),
            Err(CurveError::Overflow)
        );
        assert_eq!(
            decay(&curve(&[4, 8], &[50, 200]), U256::from(100), 0, 5),
            Err(CurveError::Underflow)
        );
    }

    #[test]
    fn legacy_time_decay() {
        let (start, end) = (U256::from(2_000), U256::from(1_000));
        assert_eq!(linear_time_decay(start, end, 100, 200, 50), start);
        assert_eq!(linear_time_decay(start, end, 100, 200, 150), U256::from(1_500));
        assert_eq!(linear_time_decay(start, end, 100, 200, 250), end);
        assert_eq!(linear_time_decay(start, start, 100, 200, 150), start);
        // end before start collapses onto the end amount
        assert_eq!(linear_time_decay(start, end, 200, 100, 150), end);
        // increasing amounts round up
        assert_eq!(
            linear_time_decay(U256::from(100), U256::from(101), 0, 3, 1),
            U256::from(101)
        );
    }
}
