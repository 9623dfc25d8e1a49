// Library surface for the binary and for headless/integration tests.
pub mod app_dirs;
pub mod assessment;
pub mod config;
pub mod error;
pub mod games;
pub mod recorder;
pub mod result;
pub mod runtime;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod store;
pub mod time_series;
pub mod util;

pub use error::{RecallError, Result};
