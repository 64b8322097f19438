use std::fmt;
use std::sync::Arc;

use ipnetwork::IpNetwork;

use crate::errors::DomainError;

/// Reserved group name routing to the default (unmatched-client) entry.
pub const GROUP_NAME_DEFAULT: &str = "default";

/// Reserved group name for private-network resolution.
pub const GROUP_NAME_PRIVATE: &str = "private";

/// The role of an upstream group, decided once during configuration
/// normalization so table construction branches on a closed set instead of
/// comparing name strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupName {
    Default,
    Private,
    Named(Arc<str>),
}

impl GroupName {
    pub fn parse(name: &str) -> Self {
        match name {
            GROUP_NAME_DEFAULT => Self::Default,
            GROUP_NAME_PRIVATE => Self::Private,
            _ => Self::Named(name.into()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => GROUP_NAME_DEFAULT,
            Self::Private => GROUP_NAME_PRIVATE,
            Self::Named(name) => name,
        }
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule matching queries to an upstream group. At least one of the two
/// fields must be set; when both are set the criterion is their intersection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCriteria {
    /// Prefix the client address must fall into.
    pub client: Option<IpNetwork>,

    /// Suffix the question domain must fall under, as written in the
    /// configuration. Normalized at table-construction time.
    pub question_domain: Option<Arc<str>>,
}

impl MatchCriteria {
    pub fn validate(&self) -> Result<(), DomainError> {
        match (&self.client, &self.question_domain) {
            (None, None) => Err(DomainError::InvalidMatchCriteria(
                "neither client nor question_domain is set".into(),
            )),
            (_, Some(domain)) if domain.is_empty() => Err(DomainError::InvalidMatchCriteria(
                "question_domain is empty".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// One configured upstream server and the rules routing queries to it.
#[derive(Debug, Clone)]
pub struct UpstreamGroup {
    pub name: GroupName,

    /// The upstream address exactly as configured. This string is also the
    /// de-duplication key in the upstream pool.
    pub address: Arc<str>,

    pub match_criteria: Vec<MatchCriteria>,
}

impl UpstreamGroup {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.address.is_empty() {
            return Err(DomainError::InvalidUpstreamAddress(String::new()));
        }

        match self.name {
            GroupName::Default | GroupName::Private => {
                if !self.match_criteria.is_empty() {
                    return Err(DomainError::InvalidMatchCriteria(format!(
                        "reserved group \"{}\" must not have match criteria",
                        self.name
                    )));
                }
            }
            GroupName::Named(_) => {
                if self.match_criteria.is_empty() {
                    return Err(DomainError::InvalidMatchCriteria(format!(
                        "group \"{}\" has no match criteria",
                        self.name
                    )));
                }
                for criteria in &self.match_criteria {
                    criteria.validate()?;
                }
            }
        }

        Ok(())
    }
}
