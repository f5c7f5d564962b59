//! ChainLab - access-controlled registries and a hash-chain integrity checker
//!
//! # Architecture
//!
//! ## Access Control
//! - [`identity`] - Opaque caller identities
//! - [`capability`] - Capability predicates (public, self-only, admin-only)
//!
//! ## Registries
//! - [`registry`] - One-time record registration, self-service or admin-managed
//! - [`voting`] - Candidate ballot with one vote per identity
//! - [`eligibility`] - Admin-tunable threshold check
//! - [`exercises`] - Open-access greeting, profile and counter stores
//!
//! ## Integrity
//! - [`integrity`] - Block digest recomputation and chain walking
//!
//! ## Persistence, Configuration & Utilities
//! - [`persistence`] - Key-value store backends (SQLite, in-memory)
//! - [`config`] - Configuration management
//! - [`cli`] - CLI utilities
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Access Control
// ============================================================================
pub mod capability;
pub mod identity;

// ============================================================================
// Registries
// ============================================================================
pub mod eligibility;
pub mod exercises;
pub mod registry;
pub mod voting;

// ============================================================================
// Integrity
// ============================================================================
pub mod integrity;

// ============================================================================
// Persistence, Configuration & Utilities
// ============================================================================
pub mod cli;
pub mod config;
pub mod error;
pub mod persistence;

pub use error::{LabError, Result};
pub use identity::Identity;
