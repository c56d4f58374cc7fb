pub mod session;
pub mod timestamp;

pub use session::{SessionSnapshot, SessionStatus};
pub use timestamp::{parse_timestamp, RawTimestamp};
