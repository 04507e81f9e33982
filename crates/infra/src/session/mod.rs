//! Session state: cookie jar, form digest cache and the clock behind it.

pub mod clock;
pub mod digest;
pub mod store;

pub use clock::{Clock, MockClock, SystemClock};
pub use digest::{ContextInfoSource, DigestCache};
pub use store::Session;
