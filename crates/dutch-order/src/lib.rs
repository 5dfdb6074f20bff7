//! Decaying swap orders: building, encoding, signing and resolving Dutch
//! orders whose amounts follow piecewise linear curves over blocks.

pub mod abi;
pub mod builder;
pub mod codec;
pub mod config;
pub mod decay;
pub mod legacy;
pub mod order;
pub mod resolve;
pub mod signing;

pub use {
    builder::{BuildError, OrderBuilder},
    codec::{DecodeError, RelativeBlocksEncoding},
    config::Config,
    decay::{CurveError, DecayCurve},
    legacy::{LegacyDutchOrder, LegacyOrderBuilder},
    order::{
        CosignedOrder,
        CosignerData,
        DutchInput,
        DutchOutput,
        Order,
        OrderInfo,
        ResolvedOrder,
        TokenAmount,
        UnsignedOrder,
    },
    resolve::{ResolveError, ResolveOptions},
    signing::{Domain, PermitData, SignatureError},
};
