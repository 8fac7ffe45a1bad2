//! In-memory query cache for async data fetching.
//!
//! Modeled on the query/mutation split of UI data-fetching libraries:
//! - reads are observed through [`QueryCache::observe`], which deduplicates
//!   concurrent fetches per key and exposes pending/success/error states;
//! - writes run through a [`MutationBinding`] that declares which key
//!   prefixes go stale on success.
//!
//! The cache lives in process memory only and is rebuilt from the server on
//! restart; there is no retry policy anywhere in this layer.

mod cache;
mod key;
mod mutation;
mod state;

pub use cache::{QueryCache, QueryHandle};
pub use key::QueryKey;
pub use mutation::MutationBinding;
pub use state::{QueryError, QueryState};
