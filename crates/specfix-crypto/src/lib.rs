//! Content hashing for specfix.
//!
//! Provides the canonical JSON encoding and the domain-separated BLAKE3
//! hasher that give every document value a position-independent identity.
//! Array elements are matched across regenerations by these hashes.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod canonical;
pub mod hasher;

pub use canonical::{to_canonical_string, write_canonical, CanonicalSink};
pub use hasher::{content_hash, ContentHasher};
