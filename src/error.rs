//! Application error type.
//!
//! Every fallible operation returns `Result<_, AppError>`. The binary prints the
//! message and exits with the carried code:
//!
//! - `2` input/schema problems (unreadable paths, missing columns, bad counts)
//! - `3` nothing to chart (no combinable files, empty table)
//! - `4` rendering or output failures

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub const INPUT: u8 = 2;
    pub const NO_DATA: u8 = 3;
    pub const OUTPUT: u8 = 4;

    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(Self::INPUT, message)
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(Self::NO_DATA, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(Self::OUTPUT, message)
    }

    /// A chart asked for a column the combined table does not have.
    pub fn missing_column(name: &str) -> Self {
        Self::input(format!("Column `{name}` not found in the combined results table."))
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
