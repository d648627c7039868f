pub mod build_info;
pub mod commands;
pub mod config;
pub mod describe;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod sort;
pub mod source;
pub mod status;
pub mod store;
pub mod tracker;
