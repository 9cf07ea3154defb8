//! # API crate: authentication, configuration and persistence for the notes service
//!
//! Everything the HTTP server needs below the routing layer lives here. The
//! server crate builds one [`Config`] at startup and hands pieces of it to the
//! constructors below; nothing in this crate reads the environment on its own
//! after that.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Session token codec (signed, expiring JWTs) and the GitHub OAuth exchange flow |
//! | [`config`] | Environment-sourced [`Config`] and its validation |
//! | [`db`] | PostgreSQL pool, migrations, and the `NoteStore` / `StateStore` implementations |
//! | [`users`] | Client for the external users service (provisioning and owner lookup) |

pub mod auth;
pub mod config;
pub mod db;
pub mod users;

pub use config::{Config, ConfigError};
