// Ember: comment insight analysis for Reddit communities.
//
// This is the library root. Each module is one stage of the
// fetch → classify → aggregate → render pipeline.

pub mod analysis;
pub mod classify;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod reddit;
