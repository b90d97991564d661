pub mod collection;
pub mod discover;
pub mod mem;
pub mod persistent;
pub mod registry;
pub mod traits;

pub use collection::{Collection, CollectionOptions, DEFAULT_MAX_ITEMS};
pub use discover::discover;
pub use mem::InMemoryStorage;
pub use persistent::PersistentStorage;
pub use registry::{Collections, LockedCollection};
pub use traits::*;
