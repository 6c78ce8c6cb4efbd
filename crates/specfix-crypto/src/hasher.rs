use serde_json::Value;
use specfix_types::ContentHash;

use crate::canonical::write_canonical;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so digests taken for different purposes never collide even
/// when the hashed bytes are identical.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for document values (array element identity).
    pub const CONTENT: Self = Self {
        domain: "specfix-content-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentHash {
        let mut hasher = self.start();
        hasher.update(data);
        ContentHash::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash the canonical encoding of a document value.
    ///
    /// Map key order does not affect the result; array order does.
    pub fn hash_value(&self, value: &Value) -> ContentHash {
        let mut hasher = self.start();
        write_canonical(value, &mut hasher);
        ContentHash::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash every element of an array, in order.
    pub fn hash_elements(&self, items: &[Value]) -> Vec<ContentHash> {
        items.iter().map(|item| self.hash_value(item)).collect()
    }

    /// Verify that `value` produces the expected hash.
    pub fn verify_value(&self, value: &Value, expected: &ContentHash) -> bool {
        self.hash_value(value) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }

    fn start(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }
}

/// [`ContentHasher::CONTENT`] applied to `value`.
pub fn content_hash(value: &Value) -> ContentHash {
    ContentHasher::CONTENT.hash_value(value)
}
