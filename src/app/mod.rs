// matchlog - app/mod.rs
//
// Application layer: stage orchestration and artifact I/O.
// Dependencies: core layer. Owns all filesystem access.

pub mod pipeline;
