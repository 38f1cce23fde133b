pub mod overview;
pub mod pipeline;
pub mod stage;

pub use overview::*;
pub use pipeline::*;
pub use stage::*;
