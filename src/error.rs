use thiserror::Error;

/// Rejections raised by [`crate::Environment::store`] when `validate` is
/// set and the supplied coordinates do not form a usable simple polygon.
#[derive(Debug, Error, PartialEq)]
pub enum PolygonError {
    #[error("polygon must have at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("polygon has consecutive duplicate or collinear-degenerate vertices")]
    DegenerateVertices,

    #[error("polygon is self-intersecting")]
    SelfIntersecting,

    #[error("boundary polygon must be wound counter-clockwise")]
    BoundaryNotCounterClockwise,

    #[error("hole polygon must be wound clockwise")]
    HoleNotClockwise,
}

/// Failures raised while answering a path query.
#[derive(Debug, Error, PartialEq)]
pub enum PathError {
    #[error("start or goal point does not lie within the traversable map")]
    OutOfMap,

    #[error("no path exists between start and goal")]
    NoPath,

    #[error(transparent)]
    BadPolygon(#[from] PolygonError),
}
