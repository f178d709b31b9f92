// tighten-ingest/src/lib.rs
// ============================================================================
// Module: Tighten Ingest
// Description: Model ingestion & filtering (C5) and profile capture (C6).
// Purpose: Turn a raw model export and a module filter into a filtered,
// supplemented logical model, and turn a profile request into a captured
// profile snapshot.
// Dependencies: tighten-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `tighten-ingest` owns the two input-side components of the pipeline
//! (`spec.md` §4.5, §4.6): [`filter`] parses and filters the logical model,
//! merging supplemental entities; [`profile`] captures a [`ProfileSnapshot`]
//! either from a fixture file or from a live connection factory.
//!
//! [`ProfileSnapshot`]: tighten_core::profile::ProfileSnapshot

pub mod error;
pub mod filter;
pub mod profile;

pub use error::IngestError;
pub use filter::EntityValidationOverride;
pub use filter::ModuleFilterOptions;
pub use filter::SupplementalOptions;
pub use filter::filter_model;
pub use filter::merge_supplemental;
pub use filter::normalize_module_selection;
pub use filter::parse_model;
pub use profile::ConnectionFactory;
pub use profile::FixtureProfileProvider;
pub use profile::LiveProfileProvider;
pub use profile::LiveProfileOptions;
pub use profile::ProfileProvider;
pub use profile::TableConnection;
