mod client_state;
mod memory;
mod schema;
mod types;

pub use memory::MemoryStorage;
pub use schema::Database;
pub use types::{DatabaseError, StateStorage};
