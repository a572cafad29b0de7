//! Repository modules for every table the session bootstrap touches.
//!
//! Each module adds methods to `ChairService` via `impl ChairService` blocks.
//! The query functions themselves take a `libsql::Connection` so the
//! provisioning transaction can reuse them.

pub mod chapter;
pub mod membership;
pub mod profile;
pub mod provision;
pub mod role;
