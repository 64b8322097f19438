use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("invalid upstream address '{0}'")]
    InvalidUpstreamAddress(String),

    #[error("unsupported scheme in upstream address '{0}'")]
    UnsupportedScheme(String),

    #[error("invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("invalid match criteria: {0}")]
    InvalidMatchCriteria(String),

    #[error("group \"{group}\": {reason}")]
    GroupBuild { group: String, reason: String },

    #[error("bootstrap resolver at index {index}: {reason}")]
    BootstrapBuild { index: usize, reason: String },

    #[error("bootstrap chain is empty, nothing to resolve with")]
    EmptyBootstrapChain,

    #[error("resolver for {server} is closed")]
    ResolverClosed { server: String },

    #[error("no addresses resolved for {0}")]
    NoAddresses(String),

    #[error("timeout waiting for {server}")]
    TransportTimeout { server: String },

    #[error("transport error for {server}: {reason}")]
    Transport { server: String, reason: String },

    #[error("{scheme} upstreams cannot be exchanged with directly")]
    UnsupportedTransport { scheme: &'static str },

    #[error("binding {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error(transparent)]
    BuildFailures(#[from] BuildFailures),
}

impl DomainError {
    /// Joins the collected errors into a single error, `Ok(())` when there
    /// are none. A single error is returned as itself.
    pub fn join(mut errors: Vec<DomainError>) -> Result<(), DomainError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(DomainError::BuildFailures(BuildFailures(errors))),
        }
    }
}

/// A list of independent failures collected during a build step that does not
/// abort on the first error.
#[derive(Debug, Clone)]
pub struct BuildFailures(pub Vec<DomainError>);

impl fmt::Display for BuildFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors: ", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for BuildFailures {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_empty_is_ok() {
        assert!(DomainError::join(vec![]).is_ok());
    }

    #[test]
    fn test_join_single_returns_it() {
        let err = DomainError::join(vec![DomainError::EmptyBootstrapChain]).unwrap_err();
        assert!(matches!(err, DomainError::EmptyBootstrapChain));
    }

    #[test]
    fn test_join_many_renders_all() {
        let err = DomainError::join(vec![
            DomainError::InvalidUpstreamAddress("x".into()),
            DomainError::GroupBuild {
                group: "office".into(),
                reason: "boom".into(),
            },
        ])
        .unwrap_err();

        let rendered = err.to_string();
        assert!(rendered.contains("2 errors"));
        assert!(rendered.contains("'x'"));
        assert!(rendered.contains("\"office\""));
    }
}
