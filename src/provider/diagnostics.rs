//! Diagnostics reported back to the user by resource operations.

use std::fmt;

use serde::Serialize;

use crate::http::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "Error"),
            Severity::Warning => write!(f, "Warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

/// Ordered collection of errors and warnings.
///
/// Operations return `Err(Diagnostics)` when at least one error was
/// recorded; warnings alone never fail an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A collection holding a single error.
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        let mut diags = Self::new();
        diags.add_error(summary, detail);
        diags
    }

    /// Renders the terminal failure of a Dashboard API call.
    ///
    /// HTTP failures carry the status code and response body so the user
    /// can see what the API objected to.
    pub fn from_api_error(summary: impl Into<String>, err: &ApiError) -> Self {
        let detail = match err {
            ApiError::Status { status, body } => format!(
                "Unexpected HTTP response status {}.\nResponse body: {}",
                status.as_u16(),
                if body.is_empty() { "<empty>" } else { body }
            ),
            ApiError::Cancelled => {
                "The operation was cancelled before the Dashboard API accepted it.".to_string()
            }
            ApiError::Transport(_) | ApiError::Decode(_) => {
                format!("HTTP client failure: {}", err)
            }
        };
        Self::error(summary, detail)
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Severity::Error, summary.into(), detail.into());
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Severity::Warning, summary.into(), detail.into());
    }

    pub fn has_error(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    fn push(&mut self, severity: Severity, summary: String, detail: String) {
        self.entries.push(Diagnostic {
            severity,
            summary,
            detail,
        });
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diag) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", diag.severity, diag.summary)?;
            if !diag.detail.is_empty() {
                write!(f, "\n  {}", diag.detail.replace('\n', "\n  "))?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_api_error_includes_status_and_body() {
        let err = ApiError::status(StatusCode::BAD_REQUEST, r#"{"errors":["Subnet overlaps"]}"#);

        let diags = Diagnostics::from_api_error("Failed to create VLAN", &err);

        assert!(diags.has_error());
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.summary, "Failed to create VLAN");
        assert!(diag.detail.contains("400"));
        assert!(diag.detail.contains("Subnet overlaps"));
    }

    #[test]
    fn test_from_api_error_empty_body() {
        let err = ApiError::status(StatusCode::BAD_GATEWAY, "");

        let diags = Diagnostics::from_api_error("Failed to read VLAN", &err);

        assert!(diags.to_string().contains("<empty>"));
    }

    #[test]
    fn test_from_api_error_cancelled_and_transport() {
        let diags = Diagnostics::from_api_error("Failed to delete VLAN", &ApiError::Cancelled);
        assert!(diags.to_string().contains("cancelled"));

        let err = ApiError::Transport("connection refused".into());
        let diags = Diagnostics::from_api_error("Failed to delete VLAN", &err);
        assert!(diags.to_string().contains("HTTP client failure"));
        assert!(diags.to_string().contains("connection refused"));
    }

    #[test]
    fn test_warnings_do_not_count_as_errors() {
        let mut diags = Diagnostics::new();
        diags.add_warning("Attribute ignored", "dhcp_options is not supported yet");

        assert!(!diags.has_error());
        assert_eq!(diags.warnings().count(), 1);

        diags.add_error("Boom", "");
        assert!(diags.has_error());
        assert_eq!(diags.iter().count(), 2);
    }

    #[test]
    fn test_display_indents_detail() {
        let diags = Diagnostics::error("Invalid import ID", "line one\nline two");

        assert_eq!(
            diags.to_string(),
            "Error: Invalid import ID\n  line one\n  line two"
        );
    }
}
