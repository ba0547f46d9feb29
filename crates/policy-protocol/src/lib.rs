// policy-protocol: Wire types for the validating-policy streaming fabric.
//
// Two messages make up the whole contract: the client's registration request
// and the server's policy snapshot response. Both travel as JSON text frames
// over a single bidirectional stream. A third pair (HealthCheckRequest /
// HealthCheckResponse) travels over a plain unary call outside the stream.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Policy records and snapshots
// ---------------------------------------------------------------------------

/// An opaque named policy record.
///
/// The body is treated as an immutable blob by the streaming fabric; nothing
/// in this crate or the sender/listener inspects its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatingPolicy {
    pub name: String,
    pub body: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

/// Sent once immediately after connecting (and again after every reconnect).
/// The server treats the first such message on a stream as registration;
/// a later one on the same stream supersedes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatingPolicyStreamRequest {
    pub client_address: String,
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// A versioned, name-ordered snapshot of the policy store.
///
/// Sent on every registration and on every policy change. `policies` is
/// always sorted by name so that two responses built from an equal policy
/// set are byte-identical once serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatingPolicyStreamResponse {
    pub current_version: u64,
    pub policies: Vec<ValidatingPolicy>,
}

// ---------------------------------------------------------------------------
// HealthCheck (unary)
// ---------------------------------------------------------------------------

/// Unary heartbeat sent by the listener on `healthCheckInterval`.
///
/// Either field empty ⇒ the sender ignores the call and still replies with
/// an empty [`HealthCheckResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckRequest {
    pub client_address: String,
    pub time: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HealthCheckResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_response_round_trips_through_json() {
        let resp = ValidatingPolicyStreamResponse {
            current_version: 7,
            policies: vec![ValidatingPolicy {
                name: "p1".to_owned(),
                body: b"x".to_vec(),
            }],
        };
        let json = serde_json::to_string(&resp).unwrap();
        let back: ValidatingPolicyStreamResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(resp, back);
    }

    #[test]
    fn stream_request_round_trips_through_json() {
        let req = ValidatingPolicyStreamRequest {
            client_address: "10.0.0.1:9000".to_owned(),
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: ValidatingPolicyStreamRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req, back);
    }

    #[test]
    fn health_check_request_carries_address_and_time() {
        let req = HealthCheckRequest {
            client_address: "A".to_owned(),
            time: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: HealthCheckRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req, back);
    }
}
