/// Database plumbing shared by the Postgres stores
///
/// - `pool`: connection pools with a per-statement timeout
/// - `migrations`: embedded migration sets, one per service database
///
/// Queries live with their models in [`crate::models`].

pub mod migrations;
pub mod pool;
