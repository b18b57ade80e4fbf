#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Token signing policy store with validated partial updates.
//!
//! Layout: `model.rs` (policy record, update and document payloads), `validate.rs`
//! (duration/pattern validation), `duration.rs` (duration grammar), `schema.rs`
//! (wire names and help text), `service.rs` (`PolicyStore` + `PolicyFacade`).

pub mod defaults;
pub mod duration;
pub mod error;
pub mod model;
pub mod schema;
pub mod service;
mod validate;

pub use error::{PolicyError, PolicyResult};
pub use model::{
    AllowedClaims, AudienceVerdict, PolicyConfig, PolicyDocument, PolicySnapshot, PolicyUpdate,
};
pub use schema::{FIELDS, FieldKind, FieldSpec, HELP_DESCRIPTION, HELP_SYNOPSIS};
pub use service::{PolicyFacade, PolicyStore, PolicyWatcher};
