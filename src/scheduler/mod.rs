//! Scheduler front end: resource requests, batch scripts and submission.

mod directives;
mod resources;
pub mod script;
pub mod submit;

pub use directives::{Directive, ResourceRequest};
pub use resources::{MemorySize, WallClock};
pub use script::{ScriptTarget, render};
pub use submit::parse_job_id;
