// tighten-artifacts/src/seeds.rs
// ============================================================================
// Module: Static-entity seed wiring (spec.md §1, §4.10)
// ============================================================================

//! ## Overview
//! "Static-seed SQL synthesis mechanics (the core only specifies *when*
//! seeds are generated and how paths flow)" is out of scope (`spec.md` §1).
//! [`SeedGenerator`] is the seam an external collaborator plugs into; this
//! crate only decides, for each static table, whether to call it and where
//! the result is written.

use tighten_core::relational::Table;

/// Produces the seed-data SQL batch for one static entity. Synthesis
/// mechanics (what rows to emit, in what order) are an external concern; the
/// core only wires the call in at the right point and routes its output to
/// `Seeds/<module>/<schema>.<table>.sql`.
pub trait SeedGenerator {
    /// Returns the seed SQL batch for `table`, or `None` if this table has
    /// nothing to seed.
    fn generate(&self, table: &Table) -> Option<String>;
}

/// A [`SeedGenerator`] that never produces seed data, used when no seed
/// collaborator is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSeedGenerator;

impl SeedGenerator for NoSeedGenerator {
    fn generate(&self, _table: &Table) -> Option<String> {
        None
    }
}
