pub mod config;
pub mod dataset;
pub mod explore;
pub mod util;
