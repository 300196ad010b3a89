pub mod arena;
pub mod geo;
pub mod handles;
pub mod ids;
pub mod math;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use arena::*;
pub use geo::*;
pub use handles::*;
pub use ids::*;
pub use time::*;
