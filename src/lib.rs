//! Root crate for `policy-sync`.
//!
//! The real logic lives in the workspace members: `sender` runs the
//! control-plane side of the streaming policy-synchronization fabric,
//! `listener` runs the client side, `policy-protocol` carries the wire
//! types shared between them, and `policy-test-utils` provides a mock
//! listener client for sender-side tests. This crate exists only to host
//! the cross-crate end-to-end integration suite under `tests/integration/`.
