//! Error types for control-plane reads and mutations.

use std::time::Duration;

use thiserror::Error;

pub type LookupResult<T> = Result<T, LookupError>;

pub type MutationResult<T> = Result<T, MutationError>;

/// A read against the control plane failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The resource no longer exists. Expected under concurrent change.
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("{resource} unreachable: {reason}")]
    Unreachable { resource: String, reason: String },

    #[error("timed out after {elapsed:?} reading {resource}")]
    Timeout { resource: String, elapsed: Duration },
}

impl LookupError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn unreachable(resource: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unreachable {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    /// The resource the failed read referred to.
    pub fn resource(&self) -> &str {
        match self {
            Self::NotFound { resource }
            | Self::Unreachable { resource, .. }
            | Self::Timeout { resource, .. } => resource,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A mutation request was rejected, failed, or timed out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// The target no longer exists.
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("request on {resource} rejected: {reason}")]
    Rejected { resource: String, reason: String },

    #[error("{resource} unreachable: {reason}")]
    Unreachable { resource: String, reason: String },

    #[error("timed out after {elapsed:?} mutating {resource}")]
    Timeout { resource: String, elapsed: Duration },
}

impl MutationError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn rejected(resource: impl Into<String>, reason: impl ToString) -> Self {
        Self::Rejected {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unreachable(resource: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unreachable {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    pub fn resource(&self) -> &str {
        match self {
            Self::NotFound { resource }
            | Self::Rejected { resource, .. }
            | Self::Unreachable { resource, .. }
            | Self::Timeout { resource, .. } => resource,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_error_carries_resource() {
        let e = LookupError::not_found("nodegroup/ng-a");
        assert_eq!(e.resource(), "nodegroup/ng-a");
        assert!(e.is_not_found());
        assert_eq!(e.to_string(), "nodegroup/ng-a not found");

        let e = LookupError::Timeout {
            resource: "asg-1".to_string(),
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(e.resource(), "asg-1");
        assert!(!e.is_not_found());
    }

    #[test]
    fn mutation_error_display() {
        let e = MutationError::rejected("i-123", "scaling activity in progress");
        assert_eq!(
            e.to_string(),
            "request on i-123 rejected: scaling activity in progress"
        );
        assert_eq!(e.resource(), "i-123");
        assert!(!e.is_not_found());
    }
}
