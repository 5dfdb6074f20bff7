//! Solidity types of the settlement contracts and their conversions from and
//! to the order model.
//!
//! The component structs are generated once per layout: `packed` and `array`
//! differ only in how relative blocks are encoded, `permit` and
//! `legacy_permit` hold the EIP-712 witness types signed through Permit2.

use {
    crate::{
        codec::DecodeError,
        decay::{CurveError, DecayCurve, MAX_CURVE_POINTS},
        order,
    },
    alloy::primitives::U256,
};

macro_rules! order_types {
    ($module:ident, [$($blocks:tt)+], $pack:expr, $unpack:expr, { $($extra:tt)* }) => {
        pub mod $module {
            use super::*;

            alloy::sol! {
                struct OrderInfo {
                    address reactor;
                    address swapper;
                    uint256 nonce;
                    uint256 deadline;
                    address additionalValidationContract;
                    bytes additionalValidationData;
                }

                struct NonlinearDutchDecay {
                    $($blocks)+ relativeBlocks;
                    int256[] relativeAmounts;
                }

                struct V3DutchInput {
                    address token;
                    uint256 startAmount;
                    NonlinearDutchDecay curve;
                    uint256 maxAmount;
                }

                struct V3DutchOutput {
                    address token;
                    uint256 startAmount;
                    NonlinearDutchDecay curve;
                    address recipient;
                    uint256 minAmount;
                }

                $($extra)*
            }

            impl From<&order::OrderInfo> for OrderInfo {
                fn from(info: &order::OrderInfo) -> Self {
                    Self {
                        reactor: info.reactor,
                        swapper: info.swapper,
                        nonce: info.nonce,
                        deadline: U256::from(info.deadline),
                        additionalValidationContract: info.additional_validation_contract,
                        additionalValidationData: info.additional_validation_data.clone(),
                    }
                }
            }

            impl TryFrom<OrderInfo> for order::OrderInfo {
                type Error = DecodeError;

                fn try_from(info: OrderInfo) -> Result<Self, Self::Error> {
                    Ok(Self {
                        reactor: info.reactor,
                        swapper: info.swapper,
                        nonce: info.nonce,
                        deadline: to_u64(info.deadline, "deadline")?,
                        additional_validation_contract: info.additionalValidationContract,
                        additional_validation_data: info.additionalValidationData,
                    })
                }
            }

            impl From<&DecayCurve> for NonlinearDutchDecay {
                fn from(curve: &DecayCurve) -> Self {
                    Self {
                        relativeBlocks: $pack(&curve.relative_blocks),
                        relativeAmounts: curve.relative_amounts.clone(),
                    }
                }
            }

            impl TryFrom<NonlinearDutchDecay> for DecayCurve {
                type Error = DecodeError;

                fn try_from(curve: NonlinearDutchDecay) -> Result<Self, Self::Error> {
                    if curve.relativeAmounts.len() > MAX_CURVE_POINTS {
                        return Err(CurveError::TooManyPoints {
                            len: curve.relativeAmounts.len(),
                        }
                        .into());
                    }
                    let curve =
                        DecayCurve::new($unpack(curve.relativeBlocks), curve.relativeAmounts);
                    curve.validate()?;
                    Ok(curve)
                }
            }

            impl From<&order::DutchInput> for V3DutchInput {
                fn from(input: &order::DutchInput) -> Self {
                    Self {
                        token: input.token,
                        startAmount: input.start_amount,
                        curve: (&input.curve).into(),
                        maxAmount: input.max_amount,
                    }
                }
            }

            impl TryFrom<V3DutchInput> for order::DutchInput {
                type Error = DecodeError;

                fn try_from(input: V3DutchInput) -> Result<Self, Self::Error> {
                    Ok(Self {
                        token: input.token,
                        start_amount: input.startAmount,
                        curve: input.curve.try_into()?,
                        max_amount: input.maxAmount,
                    })
                }
            }

            impl From<&order::DutchOutput> for V3DutchOutput {
                fn from(output: &order::DutchOutput) -> Self {
                    Self {
                        token: output.token,
                        startAmount: output.start_amount,
                        curve: (&output.curve).into(),
                        recipient: output.recipient,
                        minAmount: output.min_amount,
                    }
                }
            }

            impl TryFrom<V3DutchOutput> for order::DutchOutput {
                type Error = DecodeError;

                fn try_from(output: V3DutchOutput) -> Result<Self, Self::Error> {
                    Ok(Self {
                        token: output.token,
                        start_amount: output.startAmount,
                        curve: output.curve.try_into()?,
                        recipient: output.recipient,
                        min_amount: output.minAmount,
                    })
                }
            }
        }
    };
}

order_types!(packed, [uint256], pack_relative_blocks, unpack_relative_blocks, {
    struct CosignerData {
        uint256 decayStartBlock;
        address exclusiveFiller;
        uint256 exclusivityOverrideBps;
        uint256 inputOverride;
        uint256[] outputOverrides;
    }

    struct V3DutchOrder {
        OrderInfo info;
        address cosigner;
        V3DutchInput baseInput;
        V3DutchOutput[] baseOutputs;
        CosignerData cosignerData;
        bytes cosignature;
    }

    struct DutchInput {
        address token;
        uint256 startAmount;
        uint256 endAmount;
    }

    struct DutchOutput {
        address token;
        uint256 startAmount;
        uint256 endAmount;
        address recipient;
    }

    struct ExclusiveDutchOrder {
        OrderInfo info;
        uint256 decayStartTime;
        uint256 decayEndTime;
        address exclusiveFiller;
        uint256 exclusivityOverrideBps;
        DutchInput input;
        DutchOutput[] outputs;
    }
});

order_types!(array, [uint16[]], <[u16]>::to_vec, std::convert::identity, {
    struct CosignerData {
        uint256 decayStartBlock;
        address exclusiveFiller;
        uint256 exclusivityOverrideBps;
        uint256 inputOverride;
        uint256[] outputOverrides;
    }

    struct V3DutchOrder {
        OrderInfo info;
        address cosigner;
        V3DutchInput baseInput;
        V3DutchOutput[] baseOutputs;
        CosignerData cosignerData;
        bytes cosignature;
    }
});

order_types!(permit, [uint256], pack_relative_blocks, unpack_relative_blocks, {
    struct V3DutchOrder {
        OrderInfo info;
        address cosigner;
        V3DutchInput baseInput;
        V3DutchOutput[] baseOutputs;
    }

    struct TokenPermissions {
        address token;
        uint256 amount;
    }

    struct PermitWitnessTransferFrom {
        TokenPermissions permitted;
        address spender;
        uint256 nonce;
        uint256 deadline;
        V3DutchOrder witness;
    }
});

order_types!(legacy_permit, [uint256], pack_relative_blocks, unpack_relative_blocks, {
    struct DutchOutput {
        address token;
        uint256 startAmount;
        uint256 endAmount;
        address recipient;
    }

    struct ExclusiveDutchOrder {
        OrderInfo info;
        uint256 decayStartTime;
        uint256 decayEndTime;
        address exclusiveFiller;
        uint256 exclusivityOverrideBps;
        address inputToken;
        uint256 inputStartAmount;
        uint256 inputEndAmount;
        DutchOutput[] outputs;
    }

    struct TokenPermissions {
        address token;
        uint256 amount;
    }

    struct PermitWitnessTransferFrom {
        TokenPermissions permitted;
        address spender;
        uint256 nonce;
        uint256 deadline;
        ExclusiveDutchOrder witness;
    }
});

/// Packs up to [`MAX_CURVE_POINTS`] relative blocks into 16-bit fields of a
/// single word, the first block in the lowest bits.
pub fn pack_relative_blocks(blocks: &[u16]) -> U256 {
    blocks
        .iter()
        .take(MAX_CURVE_POINTS)
        .enumerate()
        .fold(U256::ZERO, |packed, (i, block)| {
            packed | (U256::from(*block) << (16 * i))
        })
}

/// Reads 16-bit fields from the lowest bits up, stopping at the first zero
/// field.
pub fn unpack_relative_blocks(packed: U256) -> Vec<u16> {
    packed
        .to_le_bytes::<32>()
        .chunks_exact(2)
        .map(|field| u16::from_le_bytes([field[0], field[1]]))
        .take_while(|block| *block != 0)
        .collect()
}

pub(crate) fn to_u64(value: U256, field: &'static str) -> Result<u64, DecodeError> {
    u64::try_from(value).map_err(|_| DecodeError::IntegerOutOfRange { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_blocks_into_16_bit_fields() {
        assert_eq!(pack_relative_blocks(&[]), U256::ZERO);
        assert_eq!(pack_relative_blocks(&[4]), U256::from(4));
        assert_eq!(
            pack_relative_blocks(&[4, 6]),
            U256::from(4) | (U256::from(6) << 16)
        );
        assert_eq!(
            pack_relative_blocks(&[1, 0xffff]),
            U256::from(0xffff_0001_u64)
        );
    }

    #[test]
    fn unpacks_until_first_zero_field() {
        assert_eq!(unpack_relative_blocks(U256::ZERO), Vec::<u16>::new());
        assert_eq!(unpack_relative_blocks(U256::from(0xffff_0001_u64)), vec![1, 0xffff]);
        // anything after a zero field is ignored
        let packed = U256::from(3) | (U256::from(9) << 32);
        assert_eq!(unpack_relative_blocks(packed), vec![3]);
    }

    #[test]
    fn sixteen_blocks_fill_the_word() {
        let blocks = (1..=16).map(|i| i * 100).collect::<Vec<u16>>();
        let packed = pack_relative_blocks(&blocks);
        assert_eq!(packed >> 240, U256::from(1_600));
        assert_eq!(unpack_relative_blocks(packed), blocks);
    }
}
