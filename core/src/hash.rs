//! Path hashing for cache bucket selection.

/// Hash a path string.
///
/// Polynomial string hash (seed 7, multiplier 31) over the raw bytes. The
/// key is the literal string: two spellings of the same file hash and
/// compare as different keys.
pub fn path_hash(path: &str) -> u32 {
    path.bytes()
        .fold(7u32, |hash, byte| hash.wrapping_mul(31).wrapping_add(u32::from(byte)))
}

/// Bucket index of `path` in a table of `bucket_count` buckets.
///
/// `bucket_count` must be nonzero.
pub fn bucket_of(path: &str, bucket_count: usize) -> usize {
    path_hash(path) as usize % bucket_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_empty_path_hashes_to_seed() {
        assert_eq!(path_hash(""), 7);
    }

    #[test]
    fn test_hash_is_polynomial() {
        // 7 * 31 + 'a'
        assert_eq!(path_hash("a"), 7 * 31 + 97);
        assert_eq!(path_hash("ab"), (7 * 31 + 97) * 31 + 98);
    }

    #[test]
    fn test_no_canonicalization() {
        assert_ne!(path_hash("assets/a.png"), path_hash("assets//a.png"));
        assert_ne!(path_hash("assets/a.png"), path_hash("./assets/a.png"));
    }

    #[rstest]
    #[case("", 16)]
    #[case("x", 16)]
    #[case("models/hero.gltf", 16)]
    #[case("textures\\wall.png", 3)]
    #[case("textures/wall.png", 1)]
    fn test_bucket_in_range(#[case] path: &str, #[case] buckets: usize) {
        let bucket = bucket_of(path, buckets);
        assert!(bucket < buckets);
        assert_eq!(bucket, path_hash(path) as usize % buckets);
    }
}
