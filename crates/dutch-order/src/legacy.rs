//! Time based Dutch orders with a single linear decay between a start and an
//! end amount.

use {
    crate::{
        builder::{BuildError, unix_now},
        order::OrderInfo,
    },
    alloy::primitives::{Address, Bytes, U256},
    number::serialization::HexOrDecimalU256,
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
};

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyInput {
    pub token: Address,
    #[serde_as(as = "HexOrDecimalU256")]
    pub start_amount: U256,
    #[serde_as(as = "HexOrDecimalU256")]
    pub end_amount: U256,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyOutput {
    pub token: Address,
    #[serde_as(as = "HexOrDecimalU256")]
    pub start_amount: U256,
    #[serde_as(as = "HexOrDecimalU256")]
    pub end_amount: U256,
    pub recipient: Address,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDutchOrder {
    pub(crate) info: OrderInfo,
    pub(crate) decay_start_time: u64,
    pub(crate) decay_end_time: u64,
    pub(crate) exclusive_filler: Address,
    #[serde_as(as = "HexOrDecimalU256")]
    pub(crate) exclusivity_override_bps: U256,
    pub(crate) input: LegacyInput,
    pub(crate) outputs: Vec<LegacyOutput>,
}

impl LegacyDutchOrder {
    pub fn info(&self) -> &OrderInfo {
        &self.info
    }

    pub fn decay_start_time(&self) -> u64 {
        self.decay_start_time
    }

    pub fn decay_end_time(&self) -> u64 {
        self.decay_end_time
    }

    pub fn exclusive_filler(&self) -> Option<Address> {
        (!self.exclusive_filler.is_zero()).then_some(self.exclusive_filler)
    }

    pub fn exclusivity_override_bps(&self) -> U256 {
        self.exclusivity_override_bps
    }

    pub fn input(&self) -> &LegacyInput {
        &self.input
    }

    pub fn outputs(&self) -> &[LegacyOutput] {
        &self.outputs
    }

    /// Checks the ordering of the decay window and the decay direction of
    /// every amount. Only one side of the order may decay.
    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        if self.decay_end_time < self.decay_start_time {
            return Err(BuildError::DecayEndBeforeStart {
                decay_start_time: self.decay_start_time,
                decay_end_time: self.decay_end_time,
            });
        }
        if self.info.deadline < self.decay_end_time {
            return Err(BuildError::DeadlineBeforeDecayEnd {
                deadline: self.info.deadline,
                decay_end_time: self.decay_end_time,
            });
        }
        if self.outputs.is_empty() {
            return Err(BuildError::Missing("outputs"));
        }
        if self.input.start_amount > self.input.end_amount {
            return Err(BuildError::IncorrectAmounts {
                field: "input".to_string(),
            });
        }
        for (index, output) in self.outputs.iter().enumerate() {
            if output.start_amount < output.end_amount {
                return Err(BuildError::IncorrectAmounts {
                    field: format!("outputs[{index}]"),
                });
            }
        }
        let input_decays = self.input.start_amount != self.input.end_amount;
        let output_decays = self
            .outputs
            .iter()
            .any(|output| output.start_amount != output.end_amount);
        if input_decays && output_decays {
            return Err(BuildError::InputAndOutputDecay);
        }
        Ok(())
    }
}

/// Builder for [`LegacyDutchOrder`]s, validating on [`Self::build`].
#[derive(Clone, Debug, Default)]
pub struct LegacyOrderBuilder {
    reactor: Option<Address>,
    swapper: Option<Address>,
    nonce: Option<U256>,
    deadline: Option<u64>,
    additional_validation_contract: Address,
    additional_validation_data: Bytes,
    decay_start_time: Option<u64>,
    decay_end_time: Option<u64>,
    exclusive_filler: Address,
    exclusivity_override_bps: U256,
    input: Option<LegacyInput>,
    outputs: Vec<LegacyOutput>,
}

impl LegacyOrderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_order(order: &LegacyDutchOrder) -> Self {
        Self::new()
            .with_reactor(order.info.reactor)
            .with_swapper(order.info.swapper)
            .with_nonce(order.info.nonce)
            .with_deadline(order.info.deadline)
            .with_validation(
                order.info.additional_validation_contract,
                order.info.additional_validation_data.clone(),
            )
            .with_decay_start_time(order.decay_start_time)
            .with_decay_end_time(order.decay_end_time)
            .with_exclusive_filler(order.exclusive_filler)
            .with_exclusivity_override_bps(order.exclusivity_override_bps)
            .with_input(order.input.clone())
            .with_outputs(order.outputs.clone())
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

    pub fn with_decay_start_time(mut self, time: u64) -> Self {
        self.decay_start_time = Some(time);
        self
    }

    pub fn with_decay_end_time(mut self, time: u64) -> Self {
        self.decay_end_time = Some(time);
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

    pub fn with_input(mut self, input: LegacyInput) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_output(mut self, output: LegacyOutput) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<LegacyOutput>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn build(self, now: u64) -> Result<LegacyDutchOrder, BuildError> {
        self.legacy(now)
            .inspect_err(|err| tracing::debug!(?err, "rejected legacy order"))
    }

    pub fn build_now(self) -> Result<LegacyDutchOrder, BuildError> {
        self.build(unix_now())
    }

    fn legacy(self, now: u64) -> Result<LegacyDutchOrder, BuildError> {
        let order = LegacyDutchOrder {
            info: OrderInfo {
                reactor: self.reactor.ok_or(BuildError::Missing("reactor"))?,
                swapper: self.swapper.ok_or(BuildError::Missing("swapper"))?,
                nonce: self.nonce.ok_or(BuildError::Missing("nonce"))?,
                deadline: self.deadline.ok_or(BuildError::Missing("deadline"))?,
                additional_validation_contract: self.additional_validation_contract,
                additional_validation_data: self.additional_validation_data,
            },
            decay_start_time: self
                .decay_start_time
                .ok_or(BuildError::Missing("decay start time"))?,
            decay_end_time: self
                .decay_end_time
                .ok_or(BuildError::Missing("decay end time"))?,
            exclusive_filler: self.exclusive_filler,
            exclusivity_override_bps: self.exclusivity_override_bps,
            input: self.input.ok_or(BuildError::Missing("input"))?,
            outputs: self.outputs,
        };
        if order.info.deadline <= now {
            return Err(BuildError::DeadlinePassed {
                deadline: order.info.deadline,
                now,
            });
        }
        order.validate()?;
        Ok(order)
    }
}
