pub mod event;
pub mod policy;

pub use event::{HookEvent, UnknownHook};
pub use policy::{UnknownPolicy, ZeroTestsPolicy};
