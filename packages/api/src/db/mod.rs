//! # Database module: PostgreSQL pool, migrations and stores
//!
//! ## Design
//!
//! The pool is created once by the server at startup with [`connect`] from the
//! explicit [`DatabaseConfig`](crate::config::DatabaseConfig) and then cloned into
//! each store (a `PgPool` is a cheap handle). [`migrate`] applies the SQL files
//! under `packages/api/migrations`.
//!
//! ## Re-exports
//!
//! - [`PgNoteStore`]: `store::NoteStore` over the `notes` table.
//! - [`PgStateStore`]: `store::StateStore` over the `oauth_states` table.

mod notes;
mod pool;
mod states;

pub use notes::PgNoteStore;
pub use pool::{connect, migrate};
pub use states::PgStateStore;
