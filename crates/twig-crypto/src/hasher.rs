use twig_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"twig-blob-v1"`) that is hashed
/// ahead of the payload. A blob and a tree with identical bytes therefore
/// produce different ids.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for file contents.
    pub const BLOB: Self = Self {
        domain: "twig-blob-v1",
    };
    /// Hasher for directory listings.
    pub const TREE: Self = Self {
        domain: "twig-tree-v1",
    };
    /// Hasher for commit nodes.
    pub const COMMIT: Self = Self {
        domain: "twig-commit-v1",
    };

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Returns `true` if `data` hashes to `expected` under this domain.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}
