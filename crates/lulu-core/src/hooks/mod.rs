//! Request state machines for views.
//!
//! - `Fetch`: load on mount and on dependency change, with manual refetch
//! - `Mutation`: run a write on demand with success/error callbacks
//!
//! Both turn `ApiError`s into display strings with `ApiError::user_message`.

pub mod fetch;
pub mod mutation;

pub use fetch::{Fetch, FetchState, FetchWatcher, Producer};
pub use mutation::{Mutation, MutationCallbacks, MutationState};
