/// What a [`FlagSet`](crate::FlagSet) does when an operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorHandling {
    /// Return the error to the caller.
    #[default]
    ContinueOnError,
    /// Print the error and terminate the process with status 2.
    ///
    /// Bind errors are programmer mistakes and panic instead of exiting.
    ExitOnError,
    /// Panic with the [`FlagError`](crate::FlagError) as payload.
    PanicOnError,
}

/// Iteration order for rendered usage text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsageOrder {
    /// Registered flags sorted by name.
    #[default]
    Name,
    /// The order fields were declared in, with a blank line per section break.
    Declaration,
}
