use thiserror::Error;

/// Fatal failures of a single layout run. Nothing is applied to the scene when
/// one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("malformed layout input: {0}")]
    MalformedInput(String),
    #[error("node `{id}` appears more than once in the layout input")]
    DuplicateNode { id: String },
    #[error("edge `{edge}` references unknown node `{id}`")]
    UnknownEdgeEndpoint { edge: String, id: String },
    #[error("node `{id}` has a negative or non-finite size")]
    InvalidSize { id: String },
    #[error("layered layout returned no position for node `{id}`")]
    MissingPosition { id: String },
}
