pub mod amount;
pub mod record;
pub mod transaction;

pub use record::{StoredRecord, TRANSACTION_HEADERS};
pub use transaction::{Transaction, TxnField};
