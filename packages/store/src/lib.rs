pub mod errors;
pub mod models;
pub mod repo;

mod memory;
pub use memory::MemoryStore;

pub use errors::StoreError;
pub use models::{Note, NoteDraft};
pub use repo::{NoteStore, StateStore};
