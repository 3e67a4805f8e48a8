//! # tessera-math
//!
//! Consensus-safe fixed-point arithmetic for the fee engine.
//!
//! Every value that flows through pricing, clamping and splitting is a
//! [`Dec`]: an unsigned decimal with exactly [`dec::PRECISION`] fractional
//! digits. Multiplication and division truncate toward zero, and no other
//! rounding mode exists, so independent processes always agree on the bytes.
//!
//! ## Modules
//!
//! - [`dec`] — the `Dec` fixed-point type
//! - [`stats`] — median, average and deviation over decimal lists

pub mod dec;
pub mod stats;

pub use dec::Dec;

/// Error types for decimal arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    /// Result does not fit in 256 bits.
    #[error("decimal overflow")]
    Overflow,

    /// Subtraction would produce a negative value.
    #[error("decimal underflow: {lhs} - {rhs}")]
    Underflow {
        /// Left operand.
        lhs: String,
        /// Right operand.
        rhs: String,
    },

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Text could not be parsed as a decimal.
    #[error("invalid decimal {input:?}: {reason}")]
    Parse {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Integer part does not fit the requested integer type.
    #[error("integer conversion out of range: {0}")]
    IntOutOfRange(String),

    /// An aggregate was requested over an empty list.
    #[error("empty decimal list")]
    EmptyList,
}

/// Convenience result type for math operations.
pub type Result<T> = std::result::Result<T, MathError>;
