mod protocol;
mod registry;
mod server;

pub use protocol::{ActionCall, ActionResponse, Tracker, Utterance};
pub use registry::{Action, ActionRegistry, DefaultFallbackAction, ProvideHelpAction};
pub use server::{router, serve};
