//! Value types of a multi-point Dutch order through its lifecycle:
//! a builder produces an [`UnsignedOrder`], the cosigner's data and signature
//! turn it into a [`CosignedOrder`] and resolving that at a block yields a
//! transient [`ResolvedOrder`].

use {
    crate::{decay::DecayCurve, legacy::LegacyDutchOrder},
    alloy::primitives::{Address, Bytes, U256},
    number::serialization::HexOrDecimalU256,
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
};

/// Order terms shared by every order type.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInfo {
    /// The reactor contract that settles the order.
    pub reactor: Address,
    /// The owner of the order.
    pub swapper: Address,
    /// Permit2 nonce, unique per swapper.
    #[serde_as(as = "HexOrDecimalU256")]
    pub nonce: U256,
    /// Unix timestamp after which the order can no longer be filled.
    pub deadline: u64,
    /// Optional extension hook, passed through as is.
    pub additional_validation_contract: Address,
    pub additional_validation_data: Bytes,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutchInput {
    pub token: Address,
    #[serde_as(as = "HexOrDecimalU256")]
    pub start_amount: U256,
    pub curve: DecayCurve,
    /// The most the swapper ever pays. Also the amount approved via Permit2.
    #[serde_as(as = "HexOrDecimalU256")]
    pub max_amount: U256,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutchOutput {
    pub token: Address,
    #[serde_as(as = "HexOrDecimalU256")]
    pub start_amount: U256,
    pub curve: DecayCurve,
    pub recipient: Address,
    /// The least the recipient ever receives.
    #[serde_as(as = "HexOrDecimalU256")]
    pub min_amount: U256,
}

/// Data the cosigner attaches to an order after it was signed by the swapper.
///
/// Overrides may only improve the order for the swapper: a non-zero input
/// override never exceeds the input start amount and a non-zero output
/// override is never below its output start amount. Zero means "no override".
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosignerData {
    pub decay_start_block: u64,
    /// The zero address if the order has no exclusive filler.
    pub exclusive_filler: Address,
    /// Only interpreted by the settlement contract.
    #[serde_as(as = "HexOrDecimalU256")]
    pub exclusivity_override_bps: U256,
    #[serde_as(as = "HexOrDecimalU256")]
    pub input_override: U256,
    #[serde_as(as = "Vec<HexOrDecimalU256>")]
    pub output_overrides: Vec<U256>,
}

impl CosignerData {
    pub fn exclusive_filler(&self) -> Option<Address> {
        (!self.exclusive_filler.is_zero()).then_some(self.exclusive_filler)
    }
}

/// A validated order without cosigner data.
///
/// Instances are only created by [`crate::builder::OrderBuilder`] or by
/// decoding, so they always satisfy the structural invariants.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedOrder {
    pub(crate) info: OrderInfo,
    pub(crate) cosigner: Address,
    pub(crate) input: DutchInput,
    pub(crate) outputs: Vec<DutchOutput>,
}

impl UnsignedOrder {
    pub fn info(&self) -> &OrderInfo {
        &self.info
    }

    pub fn cosigner(&self) -> Address {
        self.cosigner
    }

    pub fn input(&self) -> &DutchInput {
        &self.input
    }

    pub fn outputs(&self) -> &[DutchOutput] {
        &self.outputs
    }
}

/// An order carrying the cosigner's data and signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosignedOrder {
    #[serde(flatten)]
    pub(crate) order: UnsignedOrder,
    pub(crate) cosigner_data: CosignerData,
    pub(crate) cosignature: Bytes,
}

impl CosignedOrder {
    /// The order the swapper signed.
    pub fn unsigned(&self) -> &UnsignedOrder {
        &self.order
    }

    pub fn info(&self) -> &OrderInfo {
        &self.order.info
    }

    pub fn cosigner(&self) -> Address {
        self.order.cosigner
    }

    pub fn input(&self) -> &DutchInput {
        &self.order.input
    }

    pub fn outputs(&self) -> &[DutchOutput] {
        &self.order.outputs
    }

    pub fn cosigner_data(&self) -> &CosignerData {
        &self.cosigner_data
    }

    pub fn cosignature(&self) -> &Bytes {
        &self.cosignature
    }
}

#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    pub token: Address,
    #[serde_as(as = "HexOrDecimalU256")]
    pub amount: U256,
}

/// The amounts a filler transfers when executing an order at a specific
/// block. Exclusivity metadata is passed through untouched.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOrder {
    pub input: TokenAmount,
    pub outputs: Vec<TokenAmount>,
    pub exclusive_filler: Option<Address>,
    #[serde_as(as = "HexOrDecimalU256")]
    pub exclusivity_override_bps: U256,
}

/// Every order type handled by this crate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Order {
    Legacy(LegacyDutchOrder),
    Unsigned(UnsignedOrder),
    Cosigned(CosignedOrder),
}

impl Order {
    pub fn info(&self) -> &OrderInfo {
        match self {
            Order::Legacy(order) => &order.info,
            Order::Unsigned(order) => &order.info,
            Order::Cosigned(order) => order.info(),
        }
    }
}

impl From<LegacyDutchOrder> for Order {
    fn from(order: LegacyDutchOrder) -> Self {
        Self::Legacy(order)
    }
}

impl From<UnsignedOrder> for Order {
    fn from(order: UnsignedOrder) -> Self {
        Self::Unsigned(order)
    }
}

impl From<CosignedOrder> for Order {
    fn from(order: CosignedOrder) -> Self {
        Self::Cosigned(order)
    }
}
