pub mod ci_trigger;
pub mod command;
pub mod metrics;
pub mod overview;
pub mod pipeline;
pub mod probes;

pub use ci_trigger::*;
pub use command::*;
pub use metrics::*;
pub use pipeline::*;
pub use probes::{ProbeOutcome, ProbeResult};
