pub mod bytes;
pub mod logging;

pub use bytes::{format_bytes, mib};
pub use logging::{init_stdout_logger, StdoutLogger};
