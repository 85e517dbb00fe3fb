use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The two ways a result can be remapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RemapProtocol {
    /// V1: rewrite cell bytes in place; values may only shrink.
    InPlace,
    /// V2: build a new result, possibly with a different column set.
    Reconstruct,
}

impl fmt::Display for RemapProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemapProtocol::InPlace => f.write_str("in-place"),
            RemapProtocol::Reconstruct => f.write_str("reconstruct"),
        }
    }
}

/// How the adapter picks a [`RemapProtocol`] for a fetch.
///
/// # Examples
/// ```rust
/// use sql_remap_middleware::prelude::*;
///
/// let options = RemapOptions::default().with_protocol(ProtocolSelection::Reconstruct);
/// assert_eq!(
///     options.protocol.resolve(RemapProtocol::InPlace),
///     RemapProtocol::Reconstruct
/// );
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolSelection {
    /// Use whatever the engine reports for the connection.
    #[default]
    Negotiate,
    /// Always use the in-place protocol.
    InPlace,
    /// Always use the reconstruction protocol.
    Reconstruct,
}

impl ProtocolSelection {
    #[must_use]
    pub fn resolve(self, negotiated: RemapProtocol) -> RemapProtocol {
        match self {
            ProtocolSelection::Negotiate => negotiated,
            ProtocolSelection::InPlace => RemapProtocol::InPlace,
            ProtocolSelection::Reconstruct => RemapProtocol::Reconstruct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_resolution() {
        assert_eq!(
            ProtocolSelection::Negotiate.resolve(RemapProtocol::Reconstruct),
            RemapProtocol::Reconstruct
        );
        assert_eq!(
            ProtocolSelection::InPlace.resolve(RemapProtocol::Reconstruct),
            RemapProtocol::InPlace
        );
        assert_eq!(
            ProtocolSelection::Reconstruct.resolve(RemapProtocol::InPlace),
            RemapProtocol::Reconstruct
        );
    }

    #[test]
    fn parses_like_a_cli_flag() {
        let parsed = ProtocolSelection::from_str("in-place", true).unwrap();
        assert_eq!(parsed, ProtocolSelection::InPlace);
        assert_eq!(RemapProtocol::Reconstruct.to_string(), "reconstruct");
    }
}
