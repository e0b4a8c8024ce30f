/// Error type for fractal construction and configuration.

use thiserror::Error;

use crate::formulas::{Algebra, SubType};

#[derive(Debug, Error)]
pub enum FractalError {
    #[error("unknown algebra '{0}', expected 'quaternion' or 'hypercomplex'")]
    UnknownAlgebra(String),

    #[error("unknown sub-type '{0}'")]
    UnknownSubType(String),

    #[error("sub-type {sub_type} is not available for the {algebra} algebra")]
    UnsupportedSubType { algebra: Algebra, sub_type: SubType },

    #[error("slice vector has zero length")]
    ZeroSliceVector,

    #[error("slice vector has no t component, the 3D slice would be degenerate")]
    ZeroSliceT,

    #[error("transform matrix is singular")]
    SingularTransform,

    #[error("invalid fractal configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("parameter buffer too short: expected {expected} values, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },
}
