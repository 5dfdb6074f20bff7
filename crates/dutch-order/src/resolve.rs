//! Amounts a filler transfers when executing an order.

use {
    crate::{
        decay::{CurveError, decay, linear_time_decay},
        legacy::LegacyDutchOrder,
        order::{CosignedOrder, Order, ResolvedOrder, TokenAmount},
    },
    alloy::primitives::{Address, U256},
};

/// The chain state an order is resolved against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Block based curves decay relative to this block.
    pub current_block: u64,
    /// Time based legacy orders decay relative to this unix timestamp.
    pub timestamp: u64,
    /// Exclusivity is enforced by the reactor, so the filler does not change
    /// the resolved amounts.
    pub filler: Option<Address>,
}

impl ResolveOptions {
    pub fn at_block(current_block: u64) -> Self {
        Self {
            current_block,
            ..Default::default()
        }
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_filler(mut self, filler: Address) -> Self {
        self.filler = Some(filler);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error("order has no cosigner data")]
    MissingCosignerData,
}

/// A non-zero override replaces the decayed amount.
fn overridden(amount: Option<&U256>) -> Option<U256> {
    amount.copied().filter(|amount| !amount.is_zero())
}

impl CosignedOrder {
    /// Evaluates every curve at `options.current_block`, anchored at the
    /// cosigner's decay start block. Cosigner overrides take precedence over
    /// the curves regardless of the block.
    pub fn resolve(&self, options: &ResolveOptions) -> Result<ResolvedOrder, CurveError> {
        let data = &self.cosigner_data;
        let input = &self.order.input;
        let input_amount = match overridden(Some(&data.input_override)) {
            Some(amount) => amount,
            None => decay(
                &input.curve,
                input.start_amount,
                data.decay_start_block,
                options.current_block,
            )?,
        };

        let outputs = self
            .order
            .outputs
            .iter()
            .enumerate()
            .map(|(i, output)| {
                let amount = match overridden(data.output_overrides.get(i)) {
                    Some(amount) => amount,
                    None => decay(
                        &output.curve,
                        output.start_amount,
                        data.decay_start_block,
                        options.current_block,
                    )?,
                };
                Ok(TokenAmount {
                    token: output.token,
                    amount,
                })
            })
            .collect::<Result<Vec<_>, CurveError>>()?;

        let resolved = ResolvedOrder {
            input: TokenAmount {
                token: input.token,
                amount: input_amount,
            },
            outputs,
            exclusive_filler: data.exclusive_filler(),
            exclusivity_override_bps: data.exclusivity_override_bps,
        };
        tracing::trace!(block = options.current_block, ?resolved, "resolved order");
        Ok(resolved)
    }
}

impl LegacyDutchOrder {
    /// Decays every amount linearly over the decay window at
    /// `options.timestamp`.
    pub fn resolve(&self, options: &ResolveOptions) -> ResolvedOrder {
        let at = |start_amount, end_amount| {
            linear_time_decay(
                start_amount,
                end_amount,
                self.decay_start_time,
                self.decay_end_time,
                options.timestamp,
            )
        };
        let resolved = ResolvedOrder {
            input: TokenAmount {
                token: self.input.token,
                amount: at(self.input.start_amount, self.input.end_amount),
            },
            outputs: self
                .outputs
                .iter()
                .map(|output| TokenAmount {
                    token: output.token,
                    amount: at(output.start_amount, output.end_amount),
                })
                .collect(),
            exclusive_filler: self.exclusive_filler(),
            exclusivity_override_bps: self.exclusivity_override_bps,
        };
        tracing::trace!(timestamp = options.timestamp, ?resolved, "resolved legacy order");
        resolved
    }
}

impl Order {
    /// Orders that were not cosigned yet have no decay start block and cannot
    /// be resolved.
    pub fn resolve(&self, options: &ResolveOptions) -> Result<ResolvedOrder, ResolveError> {
        match self {
            Order::Legacy(order) => Ok(order.resolve(options)),
            Order::Unsigned(_) => Err(ResolveError::MissingCosignerData),
            Order::Cosigned(order) => Ok(order.resolve(options)?),
        }
    }
}
