//! Crate-level error taxonomy.
//!
//! Collaborator lookup failures abort a build and surface as `GraphError`.
//! Per-field value failures never reach here — the graph builder degrades
//! them to an absent value (see `value::ValueError`).

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GraphError {
    /// No schema node exists for the given identifier. Raised by schema
    /// providers; the graph builder treats it as "no match" when resolving
    /// a tile's node-group root, and as a hard failure everywhere else.
    #[error("schema node not found: {0}")]
    UnknownNode(Uuid),

    /// The schema service itself failed (connectivity, malformed data, ...).
    #[error("schema lookup failed: {0}")]
    SchemaLookup(String),

    /// A resource arrived without tiles and no tile source is configured.
    #[error("tiles not loaded for resource {0} and no tile source configured")]
    TilesNotLoaded(Uuid),

    /// The data service failed to produce a resource's tiles.
    #[error("tile load failed for resource {0}: {1}")]
    TileLoad(Uuid, String),
}
