//! Contribution and threshold calculator for French micro-entrepreneurs,
//! with a local history of saved calculations.

pub mod charges;
pub mod db;
pub mod error;
pub mod fmt;
pub mod models;
pub mod quote;
pub mod settings;
pub mod store;

pub use db::SqliteStore;
pub use error::{MicrocalcError, Result, ValidationError};
pub use models::{ActivityType, CalculationRecord, NewCalculation};
pub use store::{CalculationStore, ChangeKind, MemoryStore, StoreChange};
