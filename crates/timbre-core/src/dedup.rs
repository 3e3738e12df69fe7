//! Upload deduplication
//!
//! Callers hash uploaded bytes so an identical file isn't run through the
//! model twice in one session. This is an optimization only; the pipeline is
//! correct without it.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Hex digest identifying upload content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-session memo of successful results keyed by content hash
///
/// Failures are never remembered: trying again is a new user action.
#[derive(Debug)]
pub struct UploadMemo<T> {
    results: HashMap<ContentHash, T>,
}

impl<T: Clone> UploadMemo<T> {
    pub fn new() -> Self {
        Self {
            results: HashMap::new(),
        }
    }

    pub fn get(&self, hash: &ContentHash) -> Option<&T> {
        self.results.get(hash)
    }

    /// Return the remembered result for `hash`, or compute and remember it.
    ///
    /// The boolean is `true` when the result came from the memo.
    pub fn get_or_try_insert<E, F>(&mut self, hash: &ContentHash, compute: F) -> Result<(T, bool), E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(hit) = self.results.get(hash) {
            log::debug!("Upload {} already processed, reusing result", hash);
            return Ok((hit.clone(), true));
        }

        let value = compute()?;
        self.results.insert(hash.clone(), value.clone());
        Ok((value, false))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<T: Clone> Default for UploadMemo<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_content_based() {
        assert_eq!(ContentHash::of(b"abc"), ContentHash::of(b"abc"));
        assert_ne!(ContentHash::of(b"abc"), ContentHash::of(b"abd"));
        assert_eq!(ContentHash::of(b"").as_str().len(), 64);
    }

    #[test]
    fn test_memo_skips_identical_content() {
        let mut memo: UploadMemo<u32> = UploadMemo::new();
        let mut calls = 0;

        let (first, cached) = memo
            .get_or_try_insert::<(), _>(&ContentHash::of(b"clip"), || {
                calls += 1;
                Ok(7)
            })
            .unwrap();
        assert_eq!((first, cached), (7, false));

        let (second, cached) = memo
            .get_or_try_insert::<(), _>(&ContentHash::of(b"clip"), || {
                calls += 1;
                Ok(8)
            })
            .unwrap();
        assert_eq!((second, cached), (7, true));
        assert_eq!(calls, 1);
        assert_eq!(memo.len(), 1);
        assert_eq!(memo.get(&ContentHash::of(b"clip")), Some(&7));
    }

    #[test]
    fn test_memo_does_not_cache_failures() {
        let mut memo: UploadMemo<u32> = UploadMemo::new();
        let hash = ContentHash::of(b"bad");
        assert!(memo.get_or_try_insert(&hash, || Err("decode")).is_err());
        assert!(memo.is_empty());

        let (value, cached) = memo.get_or_try_insert::<&str, _>(&hash, || Ok(1)).unwrap();
        assert_eq!((value, cached), (1, false));
    }
}
