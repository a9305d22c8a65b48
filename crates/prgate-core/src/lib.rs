//! Credential reconciliation and multi-approver notarization gate.
//!
//! The core is pure with respect to I/O: every external collaborator (key
//! directory, ledger transport, artifact extractor) is reached through the
//! traits in [`traits`], and every result comes back as a typed value.

pub mod engine;
pub mod error;
pub mod ids;
pub mod memory;
pub mod model;
pub mod reconcile;
pub mod supplied;
pub mod traits;

pub use engine::*;
pub use error::*;
pub use ids::*;
pub use model::*;
pub use reconcile::*;
pub use supplied::*;
pub use traits::*;
