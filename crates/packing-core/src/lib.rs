//! Strip packing: provable height bounds, three constraint encodings of the placement
//! problem, a time-budgeted height search and decoding of engine answers into placements.

pub mod batch;
pub mod bounds;
pub mod decode;
pub mod engine;
pub mod model;
pub mod search;
pub mod types;

pub use batch::solve_batch;
pub use bounds::Bounds;
pub use decode::{decode, verify_packing};
pub use engine::{
    Assignment, EngineConfig, EngineKind, SatEngine, SmtLibEngine, SmtSolver, SolvingEngine,
    Verdict,
};
pub use model::{EncodingStrategy, Model, ModelBuilder, ModelOptions};
pub use search::{SearchConfig, SearchDriver, SearchMode, SearchState};
pub use types::*;
