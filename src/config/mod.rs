// src/config/mod.rs
pub mod checker;

pub use checker::CheckerConfig;
