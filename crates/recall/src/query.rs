// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `recall query` command implementation.
//!
//! Embeds the query, pulls candidates from the vector store and ranks them
//! with the retrieval scorer (vector similarity blended with lexical overlap
//! against each candidate's stored content excerpt and summary).

use std::sync::Arc;

use recall_config::model::RecallConfig;
use recall_core::RecallError;
use recall_memory::{
    GetOptions, RetrievalScorer, ScoredCandidate, StoreResolver, VectorMatch,
    lexical_overlap_score,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::context::{build_embedder, open_store};

/// One ranked result for display.
#[derive(Debug, Serialize)]
pub struct QueryHit {
    pub id: String,
    pub score: f32,
    pub vector_score: Option<f32>,
    pub lexical_score: f32,
    pub similarity: f32,
    pub agent_id: Option<String>,
    pub summary: Option<String>,
}

impl From<ScoredCandidate<VectorMatch>> for QueryHit {
    fn from(scored: ScoredCandidate<VectorMatch>) -> Self {
        let field = |key: &str| {
            scored
                .entry
                .metadata
                .as_ref()
                .and_then(|m| m.get(key))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let agent_id = field("agent_id");
        let summary = field("summary");
        Self {
            id: scored.entry.id,
            score: scored.score,
            vector_score: scored.vector_score,
            lexical_score: scored.lexical_score,
            similarity: scored.entry.similarity,
            agent_id,
            summary,
        }
    }
}

/// Text a match is lexically scored against: its stored content excerpt and
/// summary, else its id.
pub fn lexical_text(candidate: &VectorMatch) -> String {
    let field = |key: &str| {
        candidate
            .metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    match (field("content"), field("summary")) {
        (Some(content), Some(summary)) => format!("{summary} {content}"),
        (Some(text), None) | (None, Some(text)) => text.to_string(),
        (None, None) => candidate.id.clone(),
    }
}

/// Run the `recall query` command.
pub async fn run_query(
    config: &RecallConfig,
    text: &str,
    lexical_only: bool,
    json: bool,
    cancel: &CancellationToken,
) -> Result<(), RecallError> {
    if text.trim().is_empty() {
        return Err(RecallError::InvalidInput("query text is empty".into()));
    }

    let store = open_store(config).await?;
    let embedder = build_embedder(config, lexical_only, cancel)?;
    let (query_vector, source) = embedder.resolve_vector(text).await;
    debug!(?source, dimension = query_vector.len(), "query embedded");

    let retrieval = &config.retrieval;
    let matches = store
        .get(
            &query_vector,
            GetOptions {
                top_k: retrieval.top_k,
                min_similarity: retrieval.min_similarity,
            },
        )
        .await?;

    let resolver = StoreResolver::new(Arc::clone(&store), |m: &VectorMatch| m.id.clone());
    let ranked = RetrievalScorer::new()
        .with_lexical(|m: &VectorMatch| lexical_overlap_score(text, &lexical_text(m)))
        .with_vectors(query_vector, &resolver)
        .use_vectors(retrieval.use_vectors)
        .on_resolve_error(|e, m: &VectorMatch| {
            warn!(id = %m.id, error = %e, "candidate vector unavailable");
        })
        .with_limit(retrieval.limit)
        .score(matches)
        .await;

    let hits: Vec<QueryHit> = ranked.into_iter().map(QueryHit::from).collect();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&hits).unwrap_or_else(|_| "[]".to_string())
        );
        return Ok(());
    }

    if hits.is_empty() {
        println!("no matches");
        return Ok(());
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{:>3}. {:.3}  {}  [{}]  {}",
            rank + 1,
            hit.score,
            hit.id,
            hit.agent_id.as_deref().unwrap_or("unknown"),
            hit.summary.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, metadata: Option<serde_json::Value>) -> VectorMatch {
        VectorMatch {
            id: id.into(),
            similarity: 0.5,
            metadata,
        }
    }

    #[test]
    fn lexical_text_uses_summary_and_content() {
        let m = candidate("t1", Some(serde_json::json!({"summary": "deploy plan"})));
        assert_eq!(lexical_text(&m), "deploy plan");

        let m = candidate(
            "t1",
            Some(serde_json::json!({"summary": "deploy plan", "content": "roll out friday"})),
        );
        assert_eq!(lexical_text(&m), "deploy plan roll out friday");
    }

    #[tokio::test]
    async fn indexed_entry_without_summary_scores_lexically() {
        use recall_memory::{Chunk, ChunkSink};
        use recall_test_utils::StoreHarness;

        let harness = StoreHarness::builder().build().await.unwrap();
        let content = "deploy the cache service";
        let chunk = Chunk {
            id: "board-0".into(),
            content: content.into(),
            embedding: Some(harness.lexical.embed(content)),
            ..Chunk::default()
        };
        harness.sink().register(&chunk).await.unwrap();

        let matches = harness
            .store
            .get(
                &harness.lexical.embed("deploy cache"),
                GetOptions {
                    top_k: 12,
                    min_similarity: -1.0,
                },
            )
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(lexical_text(&matches[0]), content);
        assert!(lexical_overlap_score("deploy cache", &lexical_text(&matches[0])) > 0.0);
    }

    #[test]
    fn lexical_text_falls_back_to_id() {
        assert_eq!(lexical_text(&candidate("t2", None)), "t2");
        let blank = candidate("t3", Some(serde_json::json!({"summary": "  "})));
        assert_eq!(lexical_text(&blank), "t3");
    }

    #[test]
    fn hit_pulls_display_fields_from_metadata() {
        let hit = QueryHit::from(ScoredCandidate {
            entry: candidate(
                "t1",
                Some(serde_json::json!({"agent_id": "planner", "summary": "deploy plan", "turn": 2})),
            ),
            score: 0.82,
            vector_score: Some(0.9),
            lexical_score: 0.5,
        });
        assert_eq!(hit.id, "t1");
        assert_eq!(hit.agent_id.as_deref(), Some("planner"));
        assert_eq!(hit.summary.as_deref(), Some("deploy plan"));
        assert_eq!(hit.similarity, 0.5);
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let config = RecallConfig::default();
        let err = run_query(&config, "  ", true, true, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RecallError::InvalidInput(_)));
    }
}
