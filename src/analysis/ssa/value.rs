//! Constant values that can appear in SSA form.

use std::fmt;

/// A compile-time constant materialized by [`SsaOp::Const`](crate::analysis::SsaOp::Const).
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// 32-bit signed integer.
    I32(i32),

    /// 64-bit signed integer.
    I64(i64),

    /// 64-bit floating point.
    F64(f64),

    /// Null reference.
    Null,

    /// Boolean true.
    True,

    /// Boolean false.
    False,
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}L"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Null => write!(f, "null"),
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
        }
    }
}
