pub mod config;
pub mod events;
pub mod headless;
pub mod highlight;
pub mod resolver;
pub mod session;
pub mod store;
pub mod streetview;
pub mod surface;
pub mod viewport;
pub mod xref;

pub use config::*;
pub use events::*;
pub use highlight::*;
pub use resolver::*;
pub use session::*;
pub use store::*;
pub use streetview::*;
pub use surface::*;
pub use viewport::*;
pub use xref::*;
