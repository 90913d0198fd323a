//! Account storage

mod memory;
mod snapshot;

pub use memory::InMemoryAccountManager;
pub use snapshot::{load_snapshot, save_snapshot, AccountSnapshot};
