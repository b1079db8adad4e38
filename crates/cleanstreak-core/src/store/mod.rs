mod backend;
mod memory;
mod state;

pub use backend::Backend;
pub use memory::{MemoryBackend, Operation};
pub use state::{Dashboard, RelapseOutcome, StateStore};
