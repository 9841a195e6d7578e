pub mod cli;
pub mod config;
pub mod contacts;
pub mod continuity;
pub mod delivery;
pub mod error;
pub mod journal;
pub mod materials;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod rules;
pub mod scenario;
pub mod schedule;
pub mod storage;
pub mod store;

pub use error::{PackError, PackResult};
pub use pipeline::{GenerateOptions, GeneratedPack, PackGenerator};
