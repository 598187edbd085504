//! Client-side pipeline for turning a natural-language question into a
//! generated query, a tabular result set, a narrative insight, and an
//! inferred chart encoding.
//!
//! The three remote stages (query generation, query execution, insight
//! generation) are opaque services reached through [`clients::StageClient`];
//! the decision logic lives in [`pipeline`] and [`chart`].

pub mod chart;
pub mod clients;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod value;

// Load env from a simple, standardized location resolution.
// This uses dotenvy::dotenv().ok() which loads .env if present and silently ignores if missing.
pub fn load_env() {
    let _ = dotenvy::dotenv();
}
