pub mod input;
pub mod output;

pub use input::{parse_ref_updates, PushInput, RefLineError, RefUpdate};
pub use output::{Outcome, Verdict};
