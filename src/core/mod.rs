// matchlog - core/mod.rs
//
// Core analysis layer: pure parsing and aggregation over in-memory line
// sets. No file I/O in this layer; the app layer owns paths and artifacts.

pub mod aggregate;
pub mod classify;
pub mod export;
pub mod extract;
pub mod model;
pub mod roster;
pub mod segment;
pub mod tokenizer;
pub mod window;
