//! Source-code synchronization: diff requests, class merging and the
//! serialized write queue.

mod cleanup;
mod manager;
mod refresh;
pub mod request;
pub mod tailwind;

pub use cleanup::MoveCleanup;
pub use manager::{CodeManager, SyncFailure};
pub use refresh::DelayedRefresh;
pub use request::{
    get_code_diff_requests, get_or_create_code_diff_request, CodeDiffRequest, CodeGroup, CodeInsert, CodeMove,
    CodeRemove,
};

use crate::action::Action;

/// Receives every action whose edit must reach source code.
///
/// Implementations enqueue and return immediately; the write itself happens
/// later, in call order.
pub trait CodeWriter: Send + Sync {
    fn write(&self, action: Action);
}
