pub mod bench;
pub mod config;
pub mod plot;
pub mod result;
pub mod stats;
pub mod util;
