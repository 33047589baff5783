mod desc;
mod error;
mod store;
mod transaction;

pub use desc::LocalPackage;
pub use error::{RemovalBreakage, StoreError};
pub use store::{LocalStore, Locality};
pub use transaction::{RemoveTransaction, DB_LOCK_FILE};
