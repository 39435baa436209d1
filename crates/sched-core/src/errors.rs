/// Errors produced while parsing or evaluating a repeat rule.
///
/// All variants are caller mistakes; none of them are worth retrying.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("empty repeat rule")]
    EmptyRule,
    #[error("invalid date format: {0}")]
    InvalidDate(String),
    #[error("invalid repeat argument: {0}")]
    InvalidArgument(String),
    #[error("unsupported repeat format: {0}")]
    UnsupportedRule(String),
}

impl RuleError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::EmptyRule => "empty_rule",
            Self::InvalidDate(_) => "invalid_date",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::UnsupportedRule(_) => "unsupported_rule",
        }
    }
}
