//! Session credential, cached profile and listing filters.

mod filters;
mod store;

pub use filters::{snap_min_score, FilterPatch, Filters, MAX_MIN_SCORE, MIN_SCORE_STEP};
pub use store::{SessionStore, StoreError, STORAGE_KEY};
