use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationCheck {
    pub message: String,
    pub severity: CheckSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Backend validation result for one Istio object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    #[serde(default)]
    pub checks: Vec<ValidationCheck>,
}

/// Bucket used by the config validation filter and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    Valid,
    Warning,
    NotValid,
    NotValidated,
}

impl ValidationState {
    pub fn of(validation: Option<&Validation>) -> Self {
        match validation {
            None => ValidationState::NotValidated,
            Some(v) if !v.valid => ValidationState::NotValid,
            Some(v) if v.checks.iter().any(|c| c.severity == CheckSeverity::Warning) => ValidationState::Warning,
            Some(_) => ValidationState::Valid,
        }
    }

    /// Filter value id.
    pub fn id(self) -> &'static str {
        match self {
            ValidationState::Valid => "valid",
            ValidationState::Warning => "warning",
            ValidationState::NotValid => "notvalid",
            ValidationState::NotValidated => "notvalidated",
        }
    }
}
