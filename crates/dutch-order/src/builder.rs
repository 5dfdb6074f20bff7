//! Accumulates order terms and validates them once, when the order is built.
//!
//! Setters never validate, so they can be called in any order and the
//! accumulated state can be inspected at any time. Building consumes the
//! builder; the resulting orders are immutable.

use {
    crate::{
        decay::{CurveError, DecayCurve},
        order::{CosignedOrder, CosignerData, DutchInput, DutchOutput, OrderInfo, UnsignedOrder},
    },
    alloy::primitives::{Address, Bytes, U256},
};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("deadline {deadline} is not after the current time {now}")]
    DeadlinePassed { deadline: u64, now: u64 },
    #[error("input override {override_amount} exceeds input start amount {start_amount}")]
    InputOverride {
        override_amount: U256,
        start_amount: U256,
    },
    #[error(
        "output override {override_amount} at index {index} is below output start amount \
         {start_amount}"
    )]
    OutputOverride {
        index: usize,
        override_amount: U256,
        start_amount: U256,
    },
    #[error("{overrides} output overrides for {outputs} outputs")]
    OutputOverridesLength { overrides: usize, outputs: usize },
    #[error("input end amount {end_amount} exceeds max amount {max_amount}")]
    InputBound { end_amount: U256, max_amount: U256 },
    #[error("output end amount {end_amount} at index {index} is below min amount {min_amount}")]
    OutputBound {
        index: usize,
        end_amount: U256,
        min_amount: U256,
    },
    #[error("invalid {field} curve: {source}")]
    Curve {
        field: String,
        #[source]
        source: CurveError,
    },
    #[error("decay end time {decay_end_time} is before decay start time {decay_start_time}")]
    DecayEndBeforeStart {
        decay_start_time: u64,
        decay_end_time: u64,
    },
    #[error("deadline {deadline} is before decay end time {decay_end_time}")]
    DeadlineBeforeDecayEnd { deadline: u64, decay_end_time: u64 },
    #[error("input and outputs cannot decay at the same time")]
    InputAndOutputDecay,
    #[error("start and end amounts of {field} decay in the wrong direction")]
    IncorrectAmounts { field: String },
}

/// Builder for multi-point Dutch orders.
#[derive(Clone, Debug, Default)]
pub struct OrderBuilder {
    reactor: Option<Address>,
    swapper: Option<Address>,
    nonce: Option<U256>,
    deadline: Option<u64>,
    additional_validation_contract: Address,
    additional_validation_data: Bytes,
    cosigner: Option<Address>,
    input: Option<DutchInput>,
    outputs: Vec<DutchOutput>,
    decay_start_block: Option<u64>,
    exclusive_filler: Address,
    exclusivity_override_bps: U256,
    input_override: U256,
    output_overrides: Vec<U256>,
    cosignature: Option<Bytes>,
}

impl OrderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays every field of `order` so that building again yields an equal
    /// order. Any field can be overridden before building.
    pub fn from_unsigned(order: &UnsignedOrder) -> Self {
        Self::new()
            .with_reactor(order.info.reactor)
            .with_swapper(order.info.swapper)
            .with_nonce(order.info.nonce)
            .with_deadline(order.info.deadline)
            .with_validation(
                order.info.additional_validation_contract,
                order.info.additional_validation_data.clone(),
            )
            .with_cosigner(order.cosigner)
            .with_input(order.input.clone())
            .with_outputs(order.outputs.clone())
    }

    /// Like [`Self::from_unsigned`] but also replays the cosigner data and
    /// cosignature.
    pub fn from_order(order: &CosignedOrder) -> Self {
        Self::from_unsigned(&order.order)
            .with_cosigner_data(order.cosigner_data.clone())
            .with_cosignature(order.cosignature.clone())
    }

    pub fn with_reactor(mut self, reactor: Address) -> Self {
        self.reactor = Some(reactor);
        self
    }

    pub fn with_swapper(mut self, swapper: Address) -> Self {
        self.swapper = Some(swapper);
        self
    }

    pub fn with_nonce(mut self, nonce: U256) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_deadline(mut self, deadline: u64) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_validation(mut self, contract: Address, data: Bytes) -> Self {
        self.additional_validation_contract = contract;
        self.additional_validation_data = data;
        self
    }

    pub fn with_cosigner(mut self, cosigner: Address) -> Self {
        self.cosigner = Some(cosigner);
        self
    }

    pub fn with_input(mut self, input: DutchInput) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_output(mut self, output: DutchOutput) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<DutchOutput>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_decay_start_block(mut self, block: u64) -> Self {
        self.decay_start_block = Some(block);
        self
    }

    pub fn with_exclusive_filler(mut self, filler: Address) -> Self {
        self.exclusive_filler = filler;
        self
    }

    pub fn with_exclusivity_override_bps(mut self, bps: U256) -> Self {
        self.exclusivity_override_bps = bps;
        self
    }

    pub fn with_input_override(mut self, amount: U256) -> Self {
        self.input_override = amount;
        self
    }

    pub fn with_output_overrides(mut self, amounts: Vec<U256>) -> Self {
        self.output_overrides = amounts;
        self
    }

    pub fn with_cosigner_data(self, data: CosignerData) -> Self {
        self.with_decay_start_block(data.decay_start_block)
            .with_exclusive_filler(data.exclusive_filler)
            .with_exclusivity_override_bps(data.exclusivity_override_bps)
            .with_input_override(data.input_override)
            .with_output_overrides(data.output_overrides)
    }

    pub fn with_cosignature(mut self, cosignature: Bytes) -> Self {
        self.cosignature = Some(cosignature);
        self
    }

    pub fn input(&self) -> Option<&DutchInput> {
        self.input.as_ref()
    }

    pub fn outputs(&self) -> &[DutchOutput] {
        &self.outputs
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    pub fn cosigner(&self) -> Option<Address> {
        self.cosigner
    }

    /// The cosigner data accumulated so far, if the decay start block is set.
    pub fn cosigner_data(&self) -> Option<CosignerData> {
        Some(CosignerData {
            decay_start_block: self.decay_start_block?,
            exclusive_filler: self.exclusive_filler,
            exclusivity_override_bps: self.exclusivity_override_bps,
            input_override: self.input_override,
            output_overrides: self.output_overrides.clone(),
        })
    }

    /// Builds the order handed to the cosigner. Only the input, the outputs
    /// and their curves are checked; unset order info defaults to zero.
    pub fn build_partial(self) -> Result<UnsignedOrder, BuildError> {
        self.partial()
            .inspect_err(|err| tracing::debug!(?err, "rejected partial order"))
    }

    /// Builds an order ready to be signed by the swapper.
    pub fn build_unsigned(self, now: u64) -> Result<UnsignedOrder, BuildError> {
        self.unsigned(now)
            .inspect_err(|err| tracing::debug!(?err, "rejected unsigned order"))
    }

    /// Builds the cosigned order, checking every invariant against the
    /// caller's clock `now` (unix seconds).
    pub fn build(self, now: u64) -> Result<CosignedOrder, BuildError> {
        self.cosigned(now)
            .inspect_err(|err| tracing::debug!(?err, "rejected cosigned order"))
    }

    /// [`Self::build`] against the system clock.
    pub fn build_now(self) -> Result<CosignedOrder, BuildError> {
        self.build(unix_now())
    }

    fn cosigned(mut self, now: u64) -> Result<CosignedOrder, BuildError> {
        self.cosigner.ok_or(BuildError::Missing("cosigner"))?;
        let cosignature = self
            .cosignature
            .take()
            .ok_or(BuildError::Missing("cosignature"))?;
        self.input.as_ref().ok_or(BuildError::Missing("input"))?;
        if self.outputs.is_empty() {
            return Err(BuildError::Missing("outputs"));
        }
        let cosigner_data = self
            .cosigner_data()
            .ok_or(BuildError::Missing("decay start block"))?;

        let order = self.unsigned(now)?;
        check_overrides(&order, &cosigner_data)?;

        Ok(CosignedOrder {
            order,
            cosigner_data,
            cosignature,
        })
    }

    fn unsigned(self, now: u64) -> Result<UnsignedOrder, BuildError> {
        self.reactor.ok_or(BuildError::Missing("reactor"))?;
        self.swapper.ok_or(BuildError::Missing("swapper"))?;
        self.nonce.ok_or(BuildError::Missing("nonce"))?;
        self.cosigner.ok_or(BuildError::Missing("cosigner"))?;
        let deadline = self.deadline.ok_or(BuildError::Missing("deadline"))?;
        if deadline <= now {
            return Err(BuildError::DeadlinePassed { deadline, now });
        }
        self.partial()
    }

    fn partial(self) -> Result<UnsignedOrder, BuildError> {
        let input = self.input.ok_or(BuildError::Missing("input"))?;
        if self.outputs.is_empty() {
            return Err(BuildError::Missing("outputs"));
        }

        let order = UnsignedOrder {
            info: OrderInfo {
                reactor: self.reactor.unwrap_or_default(),
                swapper: self.swapper.unwrap_or_default(),
                nonce: self.nonce.unwrap_or_default(),
                deadline: self.deadline.unwrap_or_default(),
                additional_validation_contract: self.additional_validation_contract,
                additional_validation_data: self.additional_validation_data,
            },
            cosigner: self.cosigner.unwrap_or_default(),
            input,
            outputs: self.outputs,
        };
        check_curves(&order)?;
        Ok(order)
    }
}

/// Checks every curve of the order and that no curve ends past the bound of
/// its input or output.
pub(crate) fn check_curves(order: &UnsignedOrder) -> Result<(), BuildError> {
    let input = &order.input;
    let end_amount = curve_end(&input.curve, input.start_amount, "input".to_string())?;
    if end_amount > input.max_amount {
        return Err(BuildError::InputBound {
            end_amount,
            max_amount: input.max_amount,
        });
    }

    for (index, output) in order.outputs.iter().enumerate() {
        let field = format!("outputs[{index}]");
        let end_amount = curve_end(&output.curve, output.start_amount, field)?;
        if end_amount < output.min_amount {
            return Err(BuildError::OutputBound {
                index,
                end_amount,
                min_amount: output.min_amount,
            });
        }
    }
    Ok(())
}

fn curve_end(
    curve: &DecayCurve,
    start_amount: U256,
    field: String,
) -> Result<U256, BuildError> {
    let end = curve
        .validate()
        .and_then(|()| curve.checkpoint_amounts(start_amount))
        .and_then(|_| curve.end_amount(start_amount));
    end.map_err(|source| BuildError::Curve { field, source })
}

/// A cosigner may only move amounts in the swapper's favour.
fn check_overrides(order: &UnsignedOrder, data: &CosignerData) -> Result<(), BuildError> {
    let input = &order.input;
    if !data.input_override.is_zero() && data.input_override > input.start_amount {
        return Err(BuildError::InputOverride {
            override_amount: data.input_override,
            start_amount: input.start_amount,
        });
    }

    if data.output_overrides.len() != order.outputs.len() {
        return Err(BuildError::OutputOverridesLength {
            overrides: data.output_overrides.len(),
            outputs: order.outputs.len(),
        });
    }
    for (index, (amount, output)) in data
        .output_overrides
        .iter()
        .zip(&order.outputs)
        .enumerate()
    {
        if !amount.is_zero() && *amount < output.start_amount {
            return Err(BuildError::OutputOverride {
                index,
                override_amount: *amount,
                start_amount: output.start_amount,
            });
        }
    }
    Ok(())
}

/// Current unix time in seconds.
pub(crate) fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}
