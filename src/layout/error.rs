use thiserror::Error;

/// Failure of a layout run. No partial diagram is produced when one of these
/// is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("process graph has no nodes")]
    EmptyGraph,
    #[error("node `{id}` is declared more than once")]
    DuplicateNode { id: String },
    #[error("node id `{id}` is not a valid XML element id")]
    InvalidNodeId { id: String },
    #[error("node `{node}` references undeclared lane `{lane}`")]
    UnknownLane { node: String, lane: String },
    #[error(
        "cross-lane collisions did not settle after {passes} passes (last deferred edge `{from}` -> `{to}`)"
    )]
    CollisionUnresolved {
        from: String,
        to: String,
        passes: usize,
    },
}
