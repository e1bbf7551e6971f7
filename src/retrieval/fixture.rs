// src/retrieval/fixture.rs
//! Offline backends: a JSON file of posts, or an in-memory list.
//! Both ignore the query text and only honor the limit.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{RawPost, RetrievalBackend, RetrievalError};
use crate::query::QueryExpression;

/// Reads a JSON array of `RawPost` on every search.
pub struct FixtureBackend {
    path: PathBuf,
}

impl FixtureBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

pub fn parse_posts(json: &str) -> Result<Vec<RawPost>, RetrievalError> {
    serde_json::from_str(json).map_err(|e| RetrievalError::Parse(e.to_string()))
}

#[async_trait]
impl RetrievalBackend for FixtureBackend {
    async fn search(
        &self,
        _query: &QueryExpression,
        limit: usize,
    ) -> Result<Vec<RawPost>, RetrievalError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let mut posts = parse_posts(&raw)?;
        posts.truncate(limit);
        Ok(posts)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    posts: Vec<RawPost>,
}

impl MemoryBackend {
    pub fn new(posts: Vec<RawPost>) -> Self {
        Self { posts }
    }
}

#[async_trait]
impl RetrievalBackend for MemoryBackend {
    async fn search(
        &self,
        _query: &QueryExpression,
        limit: usize,
    ) -> Result<Vec<RawPost>, RetrievalError> {
        Ok(self.posts.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{build_query, QueryOptions, SearchCriteria};

    const POSTS: &str = r#"[
        {"id":"1","timestamp":"2024-01-05T10:00:00Z","author_handle":"a","body_text":"uno",
         "url":"https://twitter.com/a/status/1","engagement":{"likes":3,"reposts":1,"replies":0}},
        {"id":"2","timestamp":"2024-01-06T10:00:00Z","body_text":"dos"}
    ]"#;

    #[test]
    fn missing_fields_take_defaults() {
        let posts = parse_posts(POSTS).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].engagement.likes, 3);
        assert_eq!(posts[1].author_handle, "");
        assert_eq!(posts[1].engagement.likes, 0);
    }

    #[tokio::test]
    async fn fixture_file_honors_limit() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("posts.json");
        std::fs::write(&p, POSTS).unwrap();

        let q = build_query(&SearchCriteria::new("x"), &QueryOptions::default()).unwrap();
        let backend = FixtureBackend::new(&p);
        assert_eq!(backend.search(&q, 1).await.unwrap().len(), 1);
        assert_eq!(backend.search(&q, 10).await.unwrap().len(), 2);

        let missing = FixtureBackend::new(dir.path().join("nope.json"));
        assert!(matches!(
            missing.search(&q, 10).await,
            Err(RetrievalError::Io(_))
        ));
    }
}
