pub mod core;
pub mod logging;
pub mod mock;
pub mod session_persistence;
pub mod tastytrade;
pub mod yahoo;

pub use logging::TracingLogSink;
pub use mock::MemoryLogSink;
