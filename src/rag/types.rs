use serde::{Deserialize, Serialize};

/// Prefix of every answer that reports a pipeline failure instead of a
/// generated answer.
pub const ERROR_SENTINEL: &str = "[RAG_ERROR]";

/// Document text. Its identity is its position in the `DocumentStore`.
pub type Document = String;

/// Outcome of one pipeline run, serialized as `{query, answer, retrieved_docs}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResult {
    pub query: String,
    pub answer: String,
    pub retrieved_docs: Vec<Document>,
}

impl RagResult {
    pub fn answered(query: impl Into<String>, answer: String, docs: Vec<Document>) -> Self {
        Self {
            query: query.into(),
            answer,
            retrieved_docs: docs,
        }
    }

    /// A failed run. `docs` keeps whatever was retrieved before the failure.
    pub fn failed(query: impl Into<String>, reason: &str, docs: Vec<Document>) -> Self {
        Self {
            query: query.into(),
            answer: format!("{} {}", ERROR_SENTINEL, reason),
            retrieved_docs: docs,
        }
    }

    pub fn is_error(&self) -> bool {
        self.answer.starts_with(ERROR_SENTINEL)
    }
}

/// Per-run accumulator for the hop loop.
#[derive(Debug, Clone)]
pub struct HopState {
    original_query: String,
    expanded_query: String,
    accumulated_documents: Vec<Document>,
    hops_completed: usize,
}

impl HopState {
    pub fn new(query: &str) -> Self {
        Self {
            original_query: query.to_string(),
            expanded_query: query.to_string(),
            accumulated_documents: Vec::new(),
            hops_completed: 0,
        }
    }

    pub fn original_query(&self) -> &str {
        &self.original_query
    }

    /// The query for the next hop: the original plus all text retrieved so far.
    pub fn expanded_query(&self) -> &str {
        &self.expanded_query
    }

    pub fn documents(&self) -> &[Document] {
        &self.accumulated_documents
    }

    pub fn hops_completed(&self) -> usize {
        self.hops_completed
    }

    /// Appends one hop's documents. Duplicates from earlier hops are kept.
    pub fn record_hop(&mut self, documents: Vec<Document>) {
        if !documents.is_empty() {
            self.expanded_query.push(' ');
            self.expanded_query.push_str(&documents.join(" "));
        }
        self.accumulated_documents.extend(documents);
        self.hops_completed += 1;
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.accumulated_documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_carries_sentinel() {
        let result = RagResult::failed("q", "empty query", vec![]);
        assert!(result.is_error());
        assert!(result.answer.starts_with("[RAG_ERROR] "));

        let ok = RagResult::answered("q", "Three years.".to_string(), vec![]);
        assert!(!ok.is_error());
    }

    #[test]
    fn result_serializes_with_boundary_field_names() {
        let result = RagResult::answered("q", "a".to_string(), vec!["d".to_string()]);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "query": "q", "answer": "a", "retrieved_docs": ["d"] })
        );
    }

    #[test]
    fn hops_expand_query_and_keep_duplicates() {
        let mut state = HopState::new("theft penalty");
        state.record_hop(vec!["doc a".to_string(), "doc b".to_string()]);
        assert_eq!(state.expanded_query(), "theft penalty doc a doc b");

        state.record_hop(vec!["doc a".to_string()]);
        assert_eq!(state.expanded_query(), "theft penalty doc a doc b doc a");
        assert_eq!(state.documents(), ["doc a", "doc b", "doc a"]);
        assert_eq!(state.hops_completed(), 2);
        assert_eq!(state.original_query(), "theft penalty");
    }

    #[test]
    fn empty_hop_leaves_query_unchanged() {
        let mut state = HopState::new("q");
        state.record_hop(vec![]);
        assert_eq!(state.expanded_query(), "q");
        assert_eq!(state.hops_completed(), 1);
    }
}
