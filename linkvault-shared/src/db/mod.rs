/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: Embedded schema migrations
///
/// Queries live next to their models in [`crate::models`].

pub mod migrations;
pub mod pool;
