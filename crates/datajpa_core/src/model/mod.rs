//! Domain model for the member store.
//!
//! # Responsibility
//! - Define `Member`/`Team` records and their store-assigned identities.
//! - Define paging/sorting request and result shapes.
//! - Define read-only projections (DTOs, fetch-join rows).
//!
//! # Invariants
//! - Identifiers are assigned by the store on first save and never change.
//! - The Team -> Members direction is always derived, never stored.

pub mod dto;
pub mod member;
pub mod page;
pub mod team;
