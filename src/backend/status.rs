//! Object-storage HTTP status codes.

use serde::{Deserialize, Serialize};

/// Status classes returned by the object-storage API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum StatusKind {
    /// Bad request
    BadRequest = 400,
    /// Authentication required or refused
    Unauthorized = 401,
    /// Access denied
    Forbidden = 403,
    /// Resource does not exist
    NotFound = 404,
    /// Request timed out server side
    RequestTimeout = 408,
    /// Resource conflict (e.g. deleting a non-empty container)
    Conflict = 409,
    /// Content length required
    LengthRequired = 411,
    /// Precondition failed
    PreconditionFailed = 412,
    /// Entity too large
    EntityTooLarge = 413,
    /// Requested range not satisfiable
    RangeNotSatisfiable = 416,
    /// Checksum mismatch on upload
    Unprocessable = 422,
    /// Rate limit exceeded
    TooManyRequests = 429,
    /// Internal server error
    Internal = 500,
    /// Bad gateway
    BadGateway = 502,
    /// Temporarily unavailable
    Unavailable = 503,
    /// Gateway timeout
    GatewayTimeout = 504,
    /// Unknown status
    Unknown = 0,
}

impl From<u16> for StatusKind {
    fn from(status: u16) -> Self {
        match status {
            400 => StatusKind::BadRequest,
            401 => StatusKind::Unauthorized,
            403 => StatusKind::Forbidden,
            404 => StatusKind::NotFound,
            408 => StatusKind::RequestTimeout,
            409 => StatusKind::Conflict,
            411 => StatusKind::LengthRequired,
            412 => StatusKind::PreconditionFailed,
            413 => StatusKind::EntityTooLarge,
            416 => StatusKind::RangeNotSatisfiable,
            422 => StatusKind::Unprocessable,
            429 => StatusKind::TooManyRequests,
            500 => StatusKind::Internal,
            502 => StatusKind::BadGateway,
            503 => StatusKind::Unavailable,
            504 => StatusKind::GatewayTimeout,
            _ => StatusKind::Unknown,
        }
    }
}

impl StatusKind {
    /// Get human-readable description of the status.
    pub fn description(&self) -> &'static str {
        match self {
            StatusKind::BadRequest => "Bad request",
            StatusKind::Unauthorized => "Unauthorized",
            StatusKind::Forbidden => "Access denied",
            StatusKind::NotFound => "Resource does not exist",
            StatusKind::RequestTimeout => "Request timeout",
            StatusKind::Conflict => "Conflict",
            StatusKind::LengthRequired => "Length required",
            StatusKind::PreconditionFailed => "Precondition failed",
            StatusKind::EntityTooLarge => "Entity too large",
            StatusKind::RangeNotSatisfiable => "Range not satisfiable",
            StatusKind::Unprocessable => "Checksum mismatch",
            StatusKind::TooManyRequests => "Rate limit exceeded",
            StatusKind::Internal => "Internal error",
            StatusKind::BadGateway => "Bad gateway",
            StatusKind::Unavailable => "Temporarily unavailable",
            StatusKind::GatewayTimeout => "Gateway timeout",
            StatusKind::Unknown => "Unknown status",
        }
    }

    /// Whether the status denotes a server-side failure.
    pub fn is_server_error(&self) -> bool {
        (*self as u16) >= 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conversion() {
        assert_eq!(StatusKind::from(401), StatusKind::Unauthorized);
        assert_eq!(StatusKind::from(404), StatusKind::NotFound);
        assert_eq!(StatusKind::from(409), StatusKind::Conflict);
        assert_eq!(StatusKind::from(422), StatusKind::Unprocessable);
        assert_eq!(StatusKind::from(503), StatusKind::Unavailable);

        // Success codes and anything unlisted are unknown here
        assert_eq!(StatusKind::from(200), StatusKind::Unknown);
        assert_eq!(StatusKind::from(418), StatusKind::Unknown);
    }

    #[test]
    fn test_status_descriptions() {
        assert_eq!(StatusKind::Forbidden.description(), "Access denied");
        assert_eq!(StatusKind::Unprocessable.description(), "Checksum mismatch");
        assert_eq!(
            StatusKind::Unavailable.description(),
            "Temporarily unavailable"
        );
        assert_eq!(StatusKind::Unknown.description(), "Unknown status");
    }

    #[test]
    fn test_server_error_classes() {
        assert!(StatusKind::Internal.is_server_error());
        assert!(StatusKind::GatewayTimeout.is_server_error());
        assert!(!StatusKind::NotFound.is_server_error());
        assert!(!StatusKind::Unknown.is_server_error());
    }
}
