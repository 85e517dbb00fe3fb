use serde::{Deserialize, Serialize};

use crate::client::ClientLibrary;
use crate::engine::TransformEngine;
use crate::error::RemapMiddlewareError;
use crate::lifecycle::RemapMiddleware;
use crate::remap::ProtocolSelection;

/// Options for a [`RemapMiddleware`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemapOptions {
    pub protocol: ProtocolSelection,
    /// Emit a diagnostic each time a call passes through because no engine state is
    /// attached.
    pub warn_degraded: bool,
}

impl Default for RemapOptions {
    fn default() -> Self {
        Self {
            protocol: ProtocolSelection::default(),
            warn_degraded: true,
        }
    }
}

impl RemapOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_protocol(mut self, protocol: ProtocolSelection) -> Self {
        self.protocol = protocol;
        self
    }

    #[must_use]
    pub fn with_degraded_warnings(mut self, warn_degraded: bool) -> Self {
        self.warn_degraded = warn_degraded;
        self
    }

    /// Load options from JSON; missing fields take their defaults.
    ///
    /// ```rust
    /// use sql_remap_middleware::prelude::*;
    ///
    /// let opts = RemapOptions::from_json_str(r#"{ "protocol": "reconstruct" }"#)?;
    /// assert_eq!(opts.protocol, ProtocolSelection::Reconstruct);
    /// assert!(opts.warn_degraded);
    /// # Ok::<(), RemapMiddlewareError>(())
    /// ```
    ///
    /// # Errors
    /// Returns `RemapMiddlewareError::ConfigError` if the JSON is malformed or names an
    /// unknown option.
    pub fn from_json_str(json: &str) -> Result<Self, RemapMiddlewareError> {
        serde_json::from_str(json)
            .map_err(|e| RemapMiddlewareError::ConfigError(format!("invalid remap options: {e}")))
    }
}

/// Fluent builder for [`RemapOptions`].
#[derive(Debug, Clone, Default)]
pub struct RemapOptionsBuilder {
    opts: RemapOptions,
}

impl RemapOptionsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn protocol(mut self, protocol: ProtocolSelection) -> Self {
        self.opts.protocol = protocol;
        self
    }

    #[must_use]
    pub fn degraded_warnings(mut self, warn_degraded: bool) -> Self {
        self.opts.warn_degraded = warn_degraded;
        self
    }

    #[must_use]
    pub fn finish(self) -> RemapOptions {
        self.opts
    }

    /// Build a [`RemapMiddleware`] around `client` and `engine`.
    #[must_use]
    pub fn build<C: ClientLibrary, E: TransformEngine>(
        self,
        client: C,
        engine: E,
    ) -> RemapMiddleware<C, E> {
        RemapMiddleware::new(client, engine, self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_negotiate_and_warn() {
        let opts = RemapOptions::default();
        assert_eq!(opts.protocol, ProtocolSelection::Negotiate);
        assert!(opts.warn_degraded);
    }

    #[test]
    fn builder_matches_with_methods() {
        let built = RemapOptionsBuilder::new()
            .protocol(ProtocolSelection::InPlace)
            .degraded_warnings(false)
            .finish();
        let chained = RemapOptions::new()
            .with_protocol(ProtocolSelection::InPlace)
            .with_degraded_warnings(false);
        assert_eq!(built, chained);
    }

    #[test]
    fn json_loading() {
        let opts =
            RemapOptions::from_json_str(r#"{"protocol":"in-place","warn_degraded":false}"#).unwrap();
        assert_eq!(opts.protocol, ProtocolSelection::InPlace);
        assert!(!opts.warn_degraded);

        assert_eq!(RemapOptions::from_json_str("{}").unwrap(), RemapOptions::default());

        let err = RemapOptions::from_json_str(r#"{"protocl":"in-place"}"#).unwrap_err();
        assert!(matches!(err, RemapMiddlewareError::ConfigError(_)));
    }
}
