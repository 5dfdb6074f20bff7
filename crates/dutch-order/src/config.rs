//! Deployment configuration: the chain and the contracts orders are built
//! for.

use {
    crate::{codec::RelativeBlocksEncoding, signing::Domain},
    alloy::primitives::{Address, address},
    anyhow::Context,
    serde::{Deserialize, Serialize},
    std::path::Path,
};

/// Permit2 is deployed to the same address on every chain.
pub const PERMIT2_ADDRESS: Address = address!("0x000000000022D473030F116dDEE9F6B43aC78BA3");

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub chain_id: u64,

    /// The reactor settling orders, the spender of every permit.
    pub reactor: Address,

    #[serde(default = "default_permit2")]
    pub permit2: Address,

    /// Layout of relative blocks expected by `reactor`.
    #[serde(default)]
    pub relative_blocks_encoding: RelativeBlocksEncoding,
}

fn default_permit2() -> Address {
    PERMIT2_ADDRESS
}

impl Config {
    pub fn from_toml(toml: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml)
    }

    /// The domain swappers sign their permits in.
    pub fn domain(&self) -> Domain {
        Domain::permit2(self.chain_id, self.permit2)
    }
}

/// Reads the configuration file at `path`.
pub fn load(path: &Path) -> anyhow::Result<Config> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("I/O error while reading {path:?}"))?;
    let config = Config::from_toml(&data)
        .with_context(|| format!("TOML syntax error while reading {path:?}"))?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use {super::*, hex_literal::hex};

    #[test]
    fn canonical_permit2_address() {
        assert_eq!(
            PERMIT2_ADDRESS.0.0,
            hex!("000000000022d473030f116ddee9f6b43ac78ba3")
        );
    }

    #[test]
    fn parses_minimal_config() {
        let config = Config::from_toml(
            r#"
            chain-id = 1
            reactor = "0x6000da47483062A0D734Ba3dc7576Ce6A0B645C4"
            "#,
        )
        .unwrap();
        assert_eq!(
            config,
            Config {
                chain_id: 1,
                reactor: address!("0x6000da47483062A0D734Ba3dc7576Ce6A0B645C4"),
                permit2: PERMIT2_ADDRESS,
                relative_blocks_encoding: RelativeBlocksEncoding::Packed,
            }
        );
        assert_eq!(config.domain(), Domain::permit2(1, PERMIT2_ADDRESS));
    }

    #[test]
    fn parses_full_config() {
        let config = Config::from_toml(
            r#"
            chain-id = 42161
            reactor = "0xB274d5F4b833b61B340b654d600A864fB604a87c"
            permit2 = "0x1111111111111111111111111111111111111111"
            relative-blocks-encoding = "array"
            "#,
        )
        .unwrap();
        assert_eq!(config.chain_id, 42161);
        assert_eq!(config.permit2, Address::repeat_byte(0x11));
        assert_eq!(config.relative_blocks_encoding, RelativeBlocksEncoding::Array);
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = Config::from_toml(
            r#"
            chain-id = 1
            reactor = "0x6000da47483062A0D734Ba3dc7576Ce6A0B645C4"
            cosigner = "0x1111111111111111111111111111111111111111"
            "#,
        );
        assert!(result.is_err());
        assert!(Config::from_toml("chain-id = 1").is_err());
    }

    #[test]
    fn load_reports_path() {
        let path = Path::new("/nonexistent/dutch-order.toml");
        let err = load(path).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/dutch-order.toml"));
    }
}
