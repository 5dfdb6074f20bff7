//! Order hashes and signatures.
//!
//! Swappers sign a Permit2 `PermitWitnessTransferFrom` with the order as the
//! witness, approving the input transfer and the order terms at once. The
//! cosigner signs `keccak256(orderHash ++ abi.encode(cosignerData))`.
//!
//! Recovery never compares against the expected signer. Callers decide what a
//! mismatch means.

use {
    crate::{
        abi::{legacy_permit, permit},
        legacy::LegacyDutchOrder,
        order::{CosignedOrder, CosignerData, Order, UnsignedOrder},
    },
    alloy::{
        primitives::{Address, B256, Signature, U256, keccak256},
        sol_types::{Eip712Domain, SolStruct, SolValue, eip712_domain},
    },
};

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("signature must be 65 bytes but has {0}")]
    InvalidLength(usize),
    #[error("invalid signature: {0}")]
    Invalid(#[from] alloy::primitives::SignatureError),
}

/// The EIP-712 domain orders are signed in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Domain(pub Eip712Domain);

impl Domain {
    /// Permit2's domain has no version.
    pub fn permit2(chain_id: u64, permit2: Address) -> Self {
        Self(eip712_domain! {
            name: "Permit2",
            chain_id: chain_id,
            verifying_contract: permit2,
        })
    }

    pub fn separator(&self) -> B256 {
        self.0.separator()
    }
}

/// Typed data handed to a wallet. `values` is the primary struct.
#[derive(Clone, Debug)]
pub struct PermitData<T> {
    pub domain: Domain,
    pub values: T,
}

impl<T: SolStruct> PermitData<T> {
    /// The EIP-712 type of `values` including every struct it references.
    pub fn encode_type(&self) -> String {
        T::eip712_encode_type().into_owned()
    }

    /// The digest the wallet signs.
    pub fn signing_hash(&self) -> B256 {
        self.values.eip712_signing_hash(&self.domain.0)
    }
}

fn recover(hash: &B256, signature: &[u8]) -> Result<Address, SignatureError> {
    if signature.len() != 65 {
        return Err(SignatureError::InvalidLength(signature.len()));
    }
    let signature = Signature::from_raw(signature)?;
    Ok(signature.recover_address_from_prehash(hash)?)
}

/// The digest the cosigner signs. Binds the cosigner data to exactly one
/// order.
pub fn cosignature_hash(order_hash: B256, data: &CosignerData) -> B256 {
    let mut message = order_hash.to_vec();
    message.extend(crate::abi::packed::CosignerData::from(data).abi_encode());
    keccak256(message)
}

impl UnsignedOrder {
    fn witness(&self) -> permit::V3DutchOrder {
        permit::V3DutchOrder {
            info: (&self.info).into(),
            cosigner: self.cosigner,
            baseInput: (&self.input).into(),
            baseOutputs: self.outputs.iter().map(Into::into).collect(),
        }
    }

    /// EIP-712 struct hash of the order. This is the order hash the reactor
    /// tracks and the cosigner commits to.
    pub fn hash(&self) -> B256 {
        self.witness().eip712_hash_struct()
    }

    /// Permits the reactor to pull at most `input.max_amount` of the input
    /// token until the order deadline.
    pub fn permit_data(&self, domain: &Domain) -> PermitData<permit::PermitWitnessTransferFrom> {
        PermitData {
            domain: domain.clone(),
            values: permit::PermitWitnessTransferFrom {
                permitted: permit::TokenPermissions {
                    token: self.input.token,
                    amount: self.input.max_amount,
                },
                spender: self.info.reactor,
                nonce: self.info.nonce,
                deadline: U256::from(self.info.deadline),
                witness: self.witness(),
            },
        }
    }

    /// Recovers the address that signed [`Self::permit_data`].
    pub fn signer(&self, domain: &Domain, signature: &[u8]) -> Result<Address, SignatureError> {
        recover(&self.permit_data(domain).signing_hash(), signature)
    }
}

impl CosignedOrder {
    pub fn hash(&self) -> B256 {
        self.order.hash()
    }

    pub fn permit_data(&self, domain: &Domain) -> PermitData<permit::PermitWitnessTransferFrom> {
        self.order.permit_data(domain)
    }

    pub fn signer(&self, domain: &Domain, signature: &[u8]) -> Result<Address, SignatureError> {
        self.order.signer(domain, signature)
    }

    pub fn cosignature_hash(&self) -> B256 {
        cosignature_hash(self.hash(), &self.cosigner_data)
    }

    /// Recovers the address that produced the cosignature.
    pub fn recover_cosigner(&self) -> Result<Address, SignatureError> {
        recover(&self.cosignature_hash(), &self.cosignature)
    }

    /// Whether the cosignature was produced by the order's cosigner.
    pub fn verify_cosigner(&self) -> bool {
        match self.recover_cosigner() {
            Ok(recovered) if recovered == self.order.cosigner => true,
            Ok(recovered) => {
                tracing::debug!(
                    expected = ?self.order.cosigner,
                    ?recovered,
                    "cosignature signed by unexpected address"
                );
                false
            }
            Err(err) => {
                tracing::debug!(?err, "cosignature cannot be recovered");
                false
            }
        }
    }
}

impl LegacyDutchOrder {
    fn witness(&self) -> legacy_permit::ExclusiveDutchOrder {
        legacy_permit::ExclusiveDutchOrder {
            info: (&self.info).into(),
            decayStartTime: U256::from(self.decay_start_time),
            decayEndTime: U256::from(self.decay_end_time),
            exclusiveFiller: self.exclusive_filler,
            exclusivityOverrideBps: self.exclusivity_override_bps,
            inputToken: self.input.token,
            inputStartAmount: self.input.start_amount,
            inputEndAmount: self.input.end_amount,
            outputs: self
                .outputs
                .iter()
                .map(|output| legacy_permit::DutchOutput {
                    token: output.token,
                    startAmount: output.start_amount,
                    endAmount: output.end_amount,
                    recipient: output.recipient,
                })
                .collect(),
        }
    }

    pub fn hash(&self) -> B256 {
        self.witness().eip712_hash_struct()
    }

    /// The permitted amount is the input end amount, the most the swapper
    /// ever pays.
    pub fn permit_data(
        &self,
        domain: &Domain,
    ) -> PermitData<legacy_permit::PermitWitnessTransferFrom> {
        PermitData {
            domain: domain.clone(),
            values: legacy_permit::PermitWitnessTransferFrom {
                permitted: legacy_permit::TokenPermissions {
                    token: self.input.token,
                    amount: self.input.end_amount,
                },
                spender: self.info.reactor,
                nonce: self.info.nonce,
                deadline: U256::from(self.info.deadline),
                witness: self.witness(),
            },
        }
    }

    pub fn signer(&self, domain: &Domain, signature: &[u8]) -> Result<Address, SignatureError> {
        recover(&self.permit_data(domain).signing_hash(), signature)
    }
}

impl Order {
    pub fn hash(&self) -> B256 {
        match self {
            Order::Legacy(order) => order.hash(),
            Order::Unsigned(order) => order.hash(),
            Order::Cosigned(order) => order.hash(),
        }
    }

    /// Recovers the swapper signature over the order's permit data.
    pub fn signer(&self, domain: &Domain, signature: &[u8]) -> Result<Address, SignatureError> {
        match self {
            Order::Legacy(order) => order.signer(domain, signature),
            Order::Unsigned(order) => order.signer(domain, signature),
            Order::Cosigned(order) => order.signer(domain, signature),
        }
    }
}
