//! Canonical ABI encoding of orders, byte for byte what the reactor decodes,
//! and the JSON interchange format.

use {
    crate::{
        abi::{self, to_u64},
        builder::BuildError,
        decay::CurveError,
        legacy::{LegacyDutchOrder, LegacyInput, LegacyOutput},
        order::{CosignedOrder, CosignerData, Order, UnsignedOrder},
    },
    alloy::{
        primitives::{Bytes, U256},
        sol_types::SolValue,
    },
    serde::{Deserialize, Serialize},
};

pub use crate::abi::{pack_relative_blocks, unpack_relative_blocks};

/// How the relative blocks of a decay curve are laid out on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelativeBlocksEncoding {
    /// Up to 16 blocks packed into 16-bit fields of a single `uint256`, as
    /// deployed reactors expect.
    #[default]
    Packed,
    /// A dynamic `uint16[]`.
    Array,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed order encoding: {0}")]
    Abi(#[from] alloy::sol_types::Error),
    #[error("invalid decay curve: {0}")]
    Curve(#[from] CurveError),
    #[error("{field} does not fit into 64 bits")]
    IntegerOutOfRange { field: &'static str },
    #[error("malformed order json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid legacy order: {0}")]
    Legacy(#[from] BuildError),
}

macro_rules! cosigned_layout {
    ($layout:ident) => {
        impl From<&CosignerData> for abi::$layout::CosignerData {
            fn from(data: &CosignerData) -> Self {
                Self {
                    decayStartBlock: U256::from(data.decay_start_block),
                    exclusiveFiller: data.exclusive_filler,
                    exclusivityOverrideBps: data.exclusivity_override_bps,
                    inputOverride: data.input_override,
                    outputOverrides: data.output_overrides.clone(),
                }
            }
        }

        impl TryFrom<abi::$layout::CosignerData> for CosignerData {
            type Error = DecodeError;

            fn try_from(data: abi::$layout::CosignerData) -> Result<Self, Self::Error> {
                Ok(Self {
                    decay_start_block: to_u64(data.decayStartBlock, "decay start block")?,
                    exclusive_filler: data.exclusiveFiller,
                    exclusivity_override_bps: data.exclusivityOverrideBps,
                    input_override: data.inputOverride,
                    output_overrides: data.outputOverrides,
                })
            }
        }

        impl abi::$layout::V3DutchOrder {
            fn new(order: &UnsignedOrder, data: &CosignerData, cosignature: &Bytes) -> Self {
                Self {
                    info: (&order.info).into(),
                    cosigner: order.cosigner,
                    baseInput: (&order.input).into(),
                    baseOutputs: order.outputs.iter().map(Into::into).collect(),
                    cosignerData: data.into(),
                    cosignature: cosignature.clone(),
                }
            }

            fn into_order(self) -> Result<CosignedOrder, DecodeError> {
                Ok(CosignedOrder {
                    order: UnsignedOrder {
                        info: self.info.try_into()?,
                        cosigner: self.cosigner,
                        input: self.baseInput.try_into()?,
                        outputs: self
                            .baseOutputs
                            .into_iter()
                            .map(TryInto::try_into)
                            .collect::<Result<_, _>>()?,
                    },
                    cosigner_data: self.cosignerData.try_into()?,
                    cosignature: self.cosignature,
                })
            }
        }
    };
}

cosigned_layout!(packed);
cosigned_layout!(array);

fn encode_v3(
    order: &UnsignedOrder,
    data: &CosignerData,
    cosignature: &Bytes,
    encoding: RelativeBlocksEncoding,
) -> Bytes {
    let encoded = match encoding {
        RelativeBlocksEncoding::Packed => {
            abi::packed::V3DutchOrder::new(order, data, cosignature).abi_encode()
        }
        RelativeBlocksEncoding::Array => {
            abi::array::V3DutchOrder::new(order, data, cosignature).abi_encode()
        }
    };
    tracing::trace!(len = encoded.len(), ?encoding, "encoded order");
    encoded.into()
}

/// Encodes a cosigned order as submitted to the reactor.
pub fn encode_order(order: &CosignedOrder, encoding: RelativeBlocksEncoding) -> Bytes {
    encode_v3(
        &order.order,
        &order.cosigner_data,
        &order.cosignature,
        encoding,
    )
}

/// Encodes an order that was not cosigned yet. The cosigner data is zeroed
/// and the cosignature left empty.
pub fn encode_unsigned(order: &UnsignedOrder, encoding: RelativeBlocksEncoding) -> Bytes {
    encode_v3(order, &CosignerData::default(), &Bytes::new(), encoding)
}

/// Decodes a cosigned order. Curves are checked structurally; amounts and
/// overrides are taken as they are.
pub fn decode_order(
    data: &[u8],
    encoding: RelativeBlocksEncoding,
) -> Result<CosignedOrder, DecodeError> {
    let order = match encoding {
        RelativeBlocksEncoding::Packed => {
            let order = abi::packed::V3DutchOrder::abi_decode(data)?;
            order.into_order()
        }
        RelativeBlocksEncoding::Array => {
            let order = abi::array::V3DutchOrder::abi_decode(data)?;
            order.into_order()
        }
    };
    order
        .inspect(|_| tracing::trace!(len = data.len(), ?encoding, "decoded order"))
        .inspect_err(|err| tracing::debug!(?err, ?encoding, "failed to decode order"))
}

/// Decodes the swapper signed part of an encoded order, discarding any
/// cosigner data.
pub fn decode_unsigned(
    data: &[u8],
    encoding: RelativeBlocksEncoding,
) -> Result<UnsignedOrder, DecodeError> {
    decode_order(data, encoding).map(|order| order.order)
}

impl From<&LegacyDutchOrder> for abi::packed::ExclusiveDutchOrder {
    fn from(order: &LegacyDutchOrder) -> Self {
        Self {
            info: (&order.info).into(),
            decayStartTime: U256::from(order.decay_start_time),
            decayEndTime: U256::from(order.decay_end_time),
            exclusiveFiller: order.exclusive_filler,
            exclusivityOverrideBps: order.exclusivity_override_bps,
            input: abi::packed::DutchInput {
                token: order.input.token,
                startAmount: order.input.start_amount,
                endAmount: order.input.end_amount,
            },
            outputs: order
                .outputs
                .iter()
                .map(|output| abi::packed::DutchOutput {
                    token: output.token,
                    startAmount: output.start_amount,
                    endAmount: output.end_amount,
                    recipient: output.recipient,
                })
                .collect(),
        }
    }
}

impl TryFrom<abi::packed::ExclusiveDutchOrder> for LegacyDutchOrder {
    type Error = DecodeError;

    fn try_from(order: abi::packed::ExclusiveDutchOrder) -> Result<Self, Self::Error> {
        Ok(Self {
            info: order.info.try_into()?,
            decay_start_time: to_u64(order.decayStartTime, "decay start time")?,
            decay_end_time: to_u64(order.decayEndTime, "decay end time")?,
            exclusive_filler: order.exclusiveFiller,
            exclusivity_override_bps: order.exclusivityOverrideBps,
            input: LegacyInput {
                token: order.input.token,
                start_amount: order.input.startAmount,
                end_amount: order.input.endAmount,
            },
            outputs: order
                .outputs
                .into_iter()
                .map(|output| LegacyOutput {
                    token: output.token,
                    start_amount: output.startAmount,
                    end_amount: output.endAmount,
                    recipient: output.recipient,
                })
                .collect(),
        })
    }
}

impl UnsignedOrder {
    /// [`encode_unsigned`] with packed relative blocks.
    pub fn encode(&self) -> Bytes {
        encode_unsigned(self, RelativeBlocksEncoding::Packed)
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        decode_unsigned(data, RelativeBlocksEncoding::Packed)
    }
}

impl CosignedOrder {
    /// [`encode_order`] with packed relative blocks.
    pub fn encode(&self) -> Bytes {
        encode_order(self, RelativeBlocksEncoding::Packed)
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        decode_order(data, RelativeBlocksEncoding::Packed)
    }
}

impl LegacyDutchOrder {
    pub fn encode(&self) -> Bytes {
        abi::packed::ExclusiveDutchOrder::from(self).abi_encode().into()
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        abi::packed::ExclusiveDutchOrder::abi_decode(data)?.try_into()
    }
}

impl Order {
    pub fn encode(&self) -> Bytes {
        match self {
            Order::Legacy(order) => order.encode(),
            Order::Unsigned(order) => order.encode(),
            Order::Cosigned(order) => order.encode(),
        }
    }

    pub fn to_json(&self) -> Result<String, DecodeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses an order from JSON. Unlike plain deserialization this rejects
    /// structurally invalid curves and legacy orders whose decay window or
    /// amounts the builder would refuse. The deadline is not compared to the
    /// current time.
    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        let order: Order = serde_json::from_str(json)?;
        let unsigned = match &order {
            Order::Legacy(order) => {
                order.validate()?;
                None
            }
            Order::Unsigned(order) => Some(order),
            Order::Cosigned(order) => Some(order.unsigned()),
        };
        if let Some(unsigned) = unsigned {
            unsigned.input.curve.validate()?;
            for output in &unsigned.outputs {
                output.curve.validate()?;
            }
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            builder::{
                self,
                tests::{NOW, builder, int},
            },
            decay::DecayCurve,
            legacy,
            order::{DutchInput, DutchOutput},
        },
        alloy::primitives::Address,
    };

    fn cosigned() -> CosignedOrder {
        builder()
            .with_exclusive_filler(Address::repeat_byte(0x33))
            .with_exclusivity_override_bps(U256::from(25))
            .with_input_override(U256::from(900_000))
            .with_output_overrides(vec![U256::from(2_100_000)])
            .build(NOW)
            .unwrap()
    }

    fn contains_word(data: &[u8], word: U256) -> bool {
        data.chunks_exact(32)
            .any(|chunk| chunk == word.to_be_bytes::<32>().as_slice())
    }

    #[test]
    fn cosigned_order_decodes_to_itself() {
        let order = cosigned();
        assert_eq!(CosignedOrder::decode(&order.encode()).unwrap(), order);
        let array = encode_order(&order, RelativeBlocksEncoding::Array);
        assert_eq!(
            decode_order(&array, RelativeBlocksEncoding::Array).unwrap(),
            order
        );
    }

    #[test]
    fn encoding_starts_with_tuple_offset() {
        let encoded = cosigned().encode();
        assert_eq!(encoded.len() % 32, 0);
        assert_eq!(&encoded[..32], U256::from(32).to_be_bytes::<32>().as_slice());
    }

    #[test]
    fn packed_layout_stores_blocks_in_one_word() {
        let order = cosigned();
        let packed = pack_relative_blocks(&[10, 20]);
        assert!(contains_word(&order.encode(), packed));
        assert!(!contains_word(
            &encode_order(&order, RelativeBlocksEncoding::Array),
            packed
        ));
        assert!(
            encode_order(&order, RelativeBlocksEncoding::Array).len() > order.encode().len()
        );
    }

    #[test]
    fn unsigned_encoding_has_empty_cosigner_data() {
        let order = cosigned();
        let decoded = CosignedOrder::decode(&order.unsigned().encode()).unwrap();
        assert_eq!(decoded.unsigned(), order.unsigned());
        assert_eq!(decoded.cosigner_data(), &CosignerData::default());
        assert!(decoded.cosignature().is_empty());
        assert_eq!(
            UnsignedOrder::decode(&order.encode()).unwrap(),
            order.unsigned().clone()
        );
    }

    #[test]
    fn rejects_truncated_data() {
        let encoded = cosigned().encode();
        assert!(matches!(
            CosignedOrder::decode(&encoded[..encoded.len() - 32]),
            Err(DecodeError::Abi(_))
        ));
        assert!(matches!(
            CosignedOrder::decode(&[]),
            Err(DecodeError::Abi(_))
        ));
    }

    #[test]
    fn rejects_invalid_curves() {
        let order = cosigned();
        let mut abi = abi::packed::V3DutchOrder::new(
            order.unsigned(),
            order.cosigner_data(),
            order.cosignature(),
        );
        abi.baseInput.curve.relativeBlocks = pack_relative_blocks(&[5, 3]);
        assert!(matches!(
            CosignedOrder::decode(&abi.abi_encode()),
            Err(DecodeError::Curve(CurveError::NotIncreasing { index: 1 }))
        ));

        abi.baseInput.curve.relativeBlocks = pack_relative_blocks(&[5]);
        assert!(matches!(
            CosignedOrder::decode(&abi.abi_encode()),
            Err(DecodeError::Curve(CurveError::LengthMismatch {
                blocks: 1,
                amounts: 2
            }))
        ));

        abi.baseInput.curve.relativeAmounts = vec![int(1); 17];
        assert!(matches!(
            CosignedOrder::decode(&abi.abi_encode()),
            Err(DecodeError::Curve(CurveError::TooManyPoints { len: 17 }))
        ));
    }

    #[test]
    fn array_layout_rejects_zero_first_block() {
        let mut order = cosigned();
        order.order.outputs[0].curve = DecayCurve::new(vec![0, 4], vec![int(1), int(2)]);
        let encoded = encode_order(&order, RelativeBlocksEncoding::Array);
        assert!(matches!(
            decode_order(&encoded, RelativeBlocksEncoding::Array),
            Err(DecodeError::Curve(CurveError::NotIncreasing { index: 0 }))
        ));
    }

    #[test]
    fn rejects_deadline_beyond_u64() {
        let order = cosigned();
        let mut abi = abi::packed::V3DutchOrder::new(
            order.unsigned(),
            order.cosigner_data(),
            order.cosignature(),
        );
        abi.info.deadline = U256::from(u64::MAX) + U256::from(1);
        assert!(matches!(
            CosignedOrder::decode(&abi.abi_encode()),
            Err(DecodeError::IntegerOutOfRange { field: "deadline" })
        ));
    }

    #[test]
    fn legacy_order_decodes_to_itself() {
        let order = legacy::tests::builder().build(NOW).unwrap();
        let encoded = order.encode();
        assert_eq!(LegacyDutchOrder::decode(&encoded).unwrap(), order);
        assert_eq!(Order::from(order).encode(), encoded);
    }

    #[test]
    fn json_is_tagged_by_order_type() {
        let order = Order::from(cosigned());
        let json = order.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "cosigned");
        assert_eq!(value["cosignerData"]["decayStartBlock"], 100);
        assert_eq!(value["input"]["curve"]["relativeBlocks"][1], 20);
        assert_eq!(value["input"]["curve"]["relativeAmounts"][0], "-100000");
        assert_eq!(Order::from_json(&json).unwrap(), order);
    }

    #[test]
    fn flat_curves_decode_to_themselves() {
        let flat = |mut output: DutchOutput| {
            output.curve = DecayCurve::flat();
            output
        };
        let order = builder()
            .with_input(DutchInput {
                curve: DecayCurve::flat(),
                ..builder::tests::input()
            })
            .with_outputs(vec![
                flat(builder::tests::output(Address::repeat_byte(0x44))),
                flat(builder::tests::output(Address::repeat_byte(0x55))),
            ])
            .with_output_overrides(vec![U256::ZERO, U256::ZERO])
            .build(NOW)
            .unwrap();
        assert!(order.input().curve.is_empty());

        for encoding in [RelativeBlocksEncoding::Packed, RelativeBlocksEncoding::Array] {
            let encoded = encode_order(&order, encoding);
            assert_eq!(decode_order(&encoded, encoding).unwrap(), order);
            let unsigned = encode_unsigned(order.unsigned(), encoding);
            assert_eq!(
                &decode_unsigned(&unsigned, encoding).unwrap(),
                order.unsigned()
            );
        }
    }

    #[test]
    fn json_parses_every_order_type() {
        let unsigned = Order::from(cosigned().unsigned().clone());
        let json = unsigned.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "unsigned");
        assert_eq!(Order::from_json(&json).unwrap(), unsigned);

        let legacy = Order::from(legacy::tests::builder().build(NOW).unwrap());
        let json = legacy.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "legacy");
        assert_eq!(value["decayEndTime"], NOW + 120);
        assert_eq!(Order::from_json(&json).unwrap(), legacy);
    }

    #[test]
    fn json_rejects_invalid_legacy_orders() {
        let order = Order::from(legacy::tests::builder().build(NOW).unwrap());
        let mut value = serde_json::to_value(&order).unwrap();
        value["decayEndTime"] = serde_json::json!(NOW - 1);
        assert!(matches!(
            Order::from_json(&value.to_string()),
            Err(DecodeError::Legacy(BuildError::DecayEndBeforeStart { .. }))
        ));

        let mut value = serde_json::to_value(&order).unwrap();
        value["outputs"][0]["endAmount"] = serde_json::json!("3000");
        assert!(matches!(
            Order::from_json(&value.to_string()),
            Err(DecodeError::Legacy(BuildError::IncorrectAmounts { .. }))
        ));
    }

    #[test]
    fn json_rejects_invalid_curves() {
        let order = Order::from(cosigned().unsigned().clone());
        let mut value = serde_json::to_value(&order).unwrap();
        value["outputs"][0]["curve"]["relativeBlocks"] = serde_json::json!([20, 10]);
        assert!(matches!(
            Order::from_json(&value.to_string()),
            Err(DecodeError::Curve(CurveError::NotIncreasing { index: 1 }))
        ));
    }
}
