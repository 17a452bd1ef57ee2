//! Entity extraction: reference tables, heuristic resolvers, and the batch
//! pipeline that ties them together.

pub mod admission;
pub mod background;
pub mod classify;
pub mod pipeline;
pub mod programs;
pub mod tables;
