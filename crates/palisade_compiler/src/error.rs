//! Error types for resolution, compilation, and rendering.

use thiserror::Error;

/// Errors that can occur while compiling or rendering a device.
#[derive(Debug, Error)]
pub enum Error {
    /// A device includes a policy the store does not hold.
    #[error("unknown policy '{policy}'")]
    UnknownPolicy {
        /// The missing policy name.
        policy: String,
    },

    /// An object's expansion re-entered an object already being expanded.
    #[error("reference cycle through object '{object}'")]
    CycleDetected {
        /// Object at which the cycle closed.
        object: String,
    },

    /// Object nesting exceeded the resolution depth bound.
    #[error("object '{object}' nests deeper than {limit} levels")]
    DepthExceeded {
        /// Object at which the bound tripped.
        object: String,
        /// The depth bound.
        limit: usize,
    },

    /// A named service has no number under the requested protocol.
    #[error("unknown service '{service}' for protocol '{protocol}'")]
    UnknownService {
        /// The unmatched service name.
        service: String,
        /// Protocol whose table was consulted.
        protocol: String,
    },

    /// A port literal is malformed or out of range.
    #[error("invalid port '{port}'")]
    InvalidPort {
        /// The offending literal.
        port: String,
    },

    /// An address literal does not parse as an IPv4 subnet.
    #[error("invalid address '{address}'")]
    InvalidAddress {
        /// The offending literal.
        address: String,
    },

    /// A device names a vendor no renderer covers.
    #[error("no renderer for vendor '{vendor}'")]
    UnknownVendor {
        /// The vendor tag.
        vendor: String,
    },

    /// YAML serialization error.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias for compiler operations.
pub type Result<T> = std::result::Result<T, Error>;
