//! Domain object model used by hydration and collection reconciliation.
//!
//! # Responsibility
//! - Define the entity shape the hydrator reads from and writes into.
//! - Provide shared entity handles whose identity survives cloning.
//! - Define the lookup capability used to turn incoming ids into handles.
//!
//! # Invariants
//! - An entity's `kind` and primary key never change after construction.
//! - Cloning an `EntityRef` never creates a new identity.

pub mod entity;
pub mod store;
