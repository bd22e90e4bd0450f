use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::Malformed`] - The SSA function is not well formed (for example a value defined twice)
///
/// ## Analysis Errors
/// - [`Error::SsaViolation`] - A use is not dominated by its definition
/// - [`Error::GraphError`] - Dominator tree or loop forest do not match the function
///
/// # Examples
///
/// ```rust,ignore
/// use gcmotion::{Error, compiler::GlobalCodeMotion};
///
/// match GlobalCodeMotion::new().run(&mut ssa, &dominators, &loops) {
///     Ok(stats) => println!("moved {} operations", stats.moved),
///     Err(Error::GraphError(message)) => eprintln!("stale analysis: {message}"),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("malformed SSA: {message} ({file}:{line})");
///     }
///     Err(e) => eprintln!("error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The SSA function is not well formed.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A use of an SSA value is not dominated by its definition.
    ///
    /// Reported by [`verify_dominance`](crate::analysis::verify_dominance)
    /// with a description of the first offending use.
    #[error("SSA violation: {0}")]
    SsaViolation(String),

    /// An analysis result does not fit the function it is applied to.
    ///
    /// Raised when a dominator tree or loop forest was computed for a
    /// different number of blocks than the function now has.
    #[error("Graph error: {0}")]
    GraphError(String),
}
