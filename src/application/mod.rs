// Application layer - validation and orchestration in front of storage.
// Transports (HTTP, CLI) talk to the ledger only through `LedgerService`.

mod config;
mod service;

pub use config::*;
pub use service::*;
