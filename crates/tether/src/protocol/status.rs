//! Response status codes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Control status attached to every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Status {
    /// Documentation or registry listing produced by `help`.
    Info,
    /// The payload is the callable's return value.
    Ok,
    /// The request could not be dispatched; the payload is descriptive text.
    Error,
    /// The callable failed; the payload is the serialised [`RemoteError`].
    ///
    /// [`RemoteError`]: super::RemoteError
    ErrorForwarded,
}

impl Status {
    /// Numeric code used on the wire.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Info => 100,
            Self::Ok => 200,
            Self::Error => 400,
            Self::ErrorForwarded => 500,
        }
    }
}

impl From<Status> for u16 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl TryFrom<u16> for Status {
    type Error = UnknownStatus;

    fn try_from(code: u16) -> Result<Status, UnknownStatus> {
        match code {
            100 => Ok(Status::Info),
            200 => Ok(Status::Ok),
            400 => Ok(Status::Error),
            500 => Ok(Status::ErrorForwarded),
            other => Err(UnknownStatus(other)),
        }
    }
}

/// Raised when a response carries a status code outside the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unexpected status code: {0}")]
pub struct UnknownStatus(pub u16);

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Status::Info, 100)]
    #[case(Status::Ok, 200)]
    #[case(Status::Error, 400)]
    #[case(Status::ErrorForwarded, 500)]
    fn codes_match_wire_values(#[case] status: Status, #[case] code: u16) {
        assert_eq!(status.code(), code);
        assert_eq!(Status::try_from(code), Ok(status));
    }

    #[test]
    fn unknown_codes_fail_to_decode() {
        let error = serde_json::from_str::<Status>("418").expect_err("418 is not a status");
        assert!(error.to_string().contains("unexpected status code: 418"));
    }
}
