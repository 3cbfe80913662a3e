//! Rate limit decision core.
//!
//! ## Module Structure
//!
//! - `clock` - wall-clock abstraction, read once per decision
//! - `kv` - store executor seam and scalar normalization
//! - `types` - request/response/policy types and persisted key formats
//! - `dispatcher` - validation, defaults, engine dispatch, fail-open
//! - `token_bucket`, `fixed_window`, `sliding_window` - the engines
//! - `introspect` - read-only state views

pub mod clock;
pub mod dispatcher;
pub mod fixed_window;
pub mod introspect;
pub mod kv;
pub mod sliding_window;
pub mod token_bucket;
pub mod types;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatcher::Dispatcher;
pub use introspect::{Introspector, SlidingWindowEntry};
pub use kv::{AtomicProgram, KvExecutor, KvScalar};
pub use types::{Algorithm, DecisionRequest, DecisionResponse, Policy};
