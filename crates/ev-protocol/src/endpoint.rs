use std::fmt;
use std::str::FromStr;

use crate::ProtocolError;

/// Backend operations, addressed by path segment under the backend origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    CreateAffiliationToken,
    CreateToken,
    Vote,
    Status,
    Statuses,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::CreateAffiliationToken,
        Endpoint::CreateToken,
        Endpoint::Vote,
        Endpoint::Status,
        Endpoint::Statuses,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::CreateAffiliationToken => "create-affiliation-token",
            Endpoint::CreateToken => "create-token",
            Endpoint::Vote => "vote",
            Endpoint::Status => "status",
            Endpoint::Statuses => "statuses",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Endpoint {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_start_matches('/');
        Endpoint::ALL
            .into_iter()
            .find(|endpoint| endpoint.path() == trimmed)
            .ok_or_else(|| ProtocolError::UnknownEndpoint(s.to_string()))
    }
}
