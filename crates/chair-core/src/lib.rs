//! # chair-core
//!
//! Core types shared by every chapter-admin crate.
//!
//! This crate provides:
//! - Entity structs for the records the session bootstrap reads and writes
//!   (profiles, chapters, roles, membership links)
//! - The identity issued by the identity provider and its signup metadata
//! - The derived, in-memory resolved identity
//! - Status enums with state machine transitions

pub mod entities;
pub mod enums;
pub mod identity;
