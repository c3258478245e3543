//! Exchange transport, token catalog, contract registry and amount scaling.
//!
//! Everything here is loaded once per session and read-only afterward:
//! - `TokenCatalog`: symbol ↔ asset id ↔ decimals
//! - `ContractRegistry`: chain → ordered {version → contract hash}
//! - `AmountScaler`: human decimal ↔ on-chain integer amounts
//!
//! `ExchangeApi` is the single seam to the exchange REST API; `RestClient`
//! is the reqwest implementation and `MockExchange` the recording test double.

pub mod client;
pub mod contracts;
pub mod error;
pub mod mock;
pub mod scaler;
pub mod tokens;

pub use client::{BoxFuture, ExchangeApi, RestClient, MAINNET_URL, TESTNET_URL};
pub use contracts::{ContractRegistry, ResolvedContract};
pub use error::{RegistryError, RegistryResult};
pub use mock::{HttpMethod, MockExchange, RecordedCall};
pub use scaler::AmountScaler;
pub use tokens::TokenCatalog;
