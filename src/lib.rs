pub mod aggregator;
pub mod bundled;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod filter;
pub mod logging;
pub mod normalize;
pub mod sources;
pub mod storage;
pub mod topics;
pub mod tui;

pub use domain::Conference;
pub use error::{ConfradarError, Result};
