//! Pure derivation of dashboard figures from raw fetched data.
//!
//! Nothing here performs I/O or mutates its inputs, so deriving twice from the
//! same raw snapshot yields identical results.

pub mod account_stats;
pub mod allocation;
pub mod index_stats;

pub use account_stats::{AccountStats, derive_account_stats};
pub use allocation::AllocationPolicy;
pub use index_stats::{HorizonStats, IndexStats, derive_index_stats, iv_rank};
