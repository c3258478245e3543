//! Contract registry.
//!
//! `GET /exchange/contracts` answers `{chain: {version: hash}}`. Versions are
//! kept in the order the exchange lists them, oldest first, so the last
//! entry is the currently deployed contract. Relies on serde_json's
//! `preserve_order`.

use serde_json::Value;
use tracing::{debug, info};

use crate::client::ExchangeApi;
use crate::error::{RegistryError, RegistryResult};

const CONTRACTS_PATH: &str = "/exchange/contracts";

/// Result of a contract lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContract {
    /// Chain key as listed by the exchange (upper-case).
    pub chain: String,
    pub version: String,
    pub hash: String,
    /// Every hash ever deployed on this chain, oldest first.
    pub history: Vec<String>,
}

#[derive(Debug, Clone)]
struct ChainContracts {
    name: String,
    /// (version, hash) in listing order.
    versions: Vec<(String, String)>,
}

/// Read-only chain → version → contract hash map.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    chains: Vec<ChainContracts>,
}

impl ContractRegistry {
    pub async fn load(api: &dyn ExchangeApi) -> RegistryResult<Self> {
        let value = api.get(CONTRACTS_PATH, &[]).await?;
        let registry = Self::from_value(&value)?;
        info!(chains = registry.chains.len(), "Contract registry loaded");
        Ok(registry)
    }

    pub fn from_value(value: &Value) -> RegistryResult<Self> {
        let root = value.as_object().ok_or_else(|| {
            RegistryError::Deserialization("contract list is not an object".to_string())
        })?;

        let mut chains = Vec::with_capacity(root.len());
        for (chain, versions) in root {
            let versions = versions.as_object().ok_or_else(|| {
                RegistryError::Deserialization(format!("contracts for {chain} are not an object"))
            })?;

            let mut entries = Vec::with_capacity(versions.len());
            for (version, hash) in versions {
                let hash = hash.as_str().ok_or_else(|| {
                    RegistryError::Deserialization(format!(
                        "contract hash for {chain} {version} is not a string"
                    ))
                })?;
                entries.push((version.clone(), hash.to_string()));
            }

            chains.push(ChainContracts {
                name: chain.to_uppercase(),
                versions: entries,
            });
        }

        Ok(Self { chains })
    }

    /// Resolve the contract hash for `chain` at `version`.
    ///
    /// An empty `version` selects the newest (last-listed) contract. Chain
    /// names are matched case-insensitively.
    ///
    /// # Errors
    /// - `UnknownChain` if the exchange lists no such chain (or it has no versions)
    /// - `UnknownVersion` if the named version is not listed
    pub fn resolve_contract_hash(
        &self,
        chain: &str,
        version: &str,
    ) -> RegistryResult<ResolvedContract> {
        let contracts = self.chain(chain)?;

        let entry = if version.is_empty() {
            contracts.versions.last()
        } else {
            contracts
                .versions
                .iter()
                .find(|(v, _)| v.eq_ignore_ascii_case(version))
        };

        let (version, hash) = entry.ok_or_else(|| {
            if version.is_empty() {
                RegistryError::UnknownChain(chain.to_string())
            } else {
                RegistryError::UnknownVersion {
                    chain: chain.to_string(),
                    version: version.to_string(),
                }
            }
        })?;

        debug!(chain = %contracts.name, %version, %hash, "Contract resolved");

        Ok(ResolvedContract {
            chain: contracts.name.clone(),
            version: version.clone(),
            hash: hash.clone(),
            history: contracts.versions.iter().map(|(_, h)| h.clone()).collect(),
        })
    }

    /// Every contract hash listed for `chain`, oldest first.
    pub fn all_hashes(&self, chain: &str) -> RegistryResult<Vec<String>> {
        Ok(self
            .chain(chain)?
            .versions
            .iter()
            .map(|(_, h)| h.clone())
            .collect())
    }

    pub fn chains(&self) -> impl Iterator<Item = &str> {
        self.chains.iter().map(|c| c.name.as_str())
    }

    fn chain(&self, chain: &str) -> RegistryResult<&ChainContracts> {
        self.chains
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(chain))
            .ok_or_else(|| RegistryError::UnknownChain(chain.to_string()))
    }
}
