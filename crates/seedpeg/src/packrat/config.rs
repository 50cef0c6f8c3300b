/// Configuration of a [`PackratParser`](super::PackratParser).
///
/// Applies to every parse the parser runs. Per-parse choices live in
/// [`ParseOptions`].
///
/// # Example
///
/// ```rust
/// use seedpeg::packrat::PackratConfig;
///
/// // Use default configuration
/// let config = PackratConfig::default();
///
/// // Or customize it
/// let config = PackratConfig {
///     initial_stack_capacity: 64, // Activations preallocated before the first parse
///     max_depth: 10_000,          // Abort beyond this many nested rule calls
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct PackratConfig {
    /// Number of call stack slots allocated up front. The stack grows on
    /// demand past this.
    pub initial_stack_capacity: usize,

    /// Maximum number of nested rule activations.
    ///
    /// Every activation is a native call frame, so very deep right recursion
    /// would otherwise overflow the thread's stack.
    pub max_depth: usize,
}

impl Default for PackratConfig {
    fn default() -> Self {
        Self {
            initial_stack_capacity: 32,
            max_depth: 1000,
        }
    }
}

/// Options for one parse.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct ParseOptions {
    /// Index to start scanning at. `None` starts at 0.
    pub start_index: Option<usize>,

    /// Fail with [`ParseError::IncompleteConsumption`](crate::error::ParseError::IncompleteConsumption)
    /// when the start rule matches without reaching the end of the input.
    pub consume_all_input: bool,
}

impl ParseOptions {
    /// Accept a match of any prefix of the input.
    #[must_use]
    pub fn prefix() -> Self {
        Self {
            consume_all_input: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn starting_at(mut self, index: usize) -> Self {
        self.start_index = Some(index);
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            start_index: None,
            consume_all_input: true,
        }
    }
}
