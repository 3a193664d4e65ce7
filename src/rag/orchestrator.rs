//! Multi-hop retrieval followed by a single generation call.

use tracing::Instrument;
use uuid::Uuid;

use super::prompt::build_prompt;
use super::retriever::Retriever;
use super::types::{HopState, RagResult};
use crate::llm::LlmClient;

pub struct MultiHopOrchestrator {
    retriever: Retriever,
    llm: LlmClient,
}

impl MultiHopOrchestrator {
    pub fn new(retriever: Retriever, llm: LlmClient) -> Self {
        Self { retriever, llm }
    }

    /// Runs `num_hops` sequential retrievals, each on the original query
    /// extended with everything retrieved so far, then asks the LLM.
    ///
    /// Never fails outward: problems come back as a `RagResult` whose answer
    /// starts with `ERROR_SENTINEL` and whose `retrieved_docs` hold the hops
    /// completed before the failure.
    pub async fn run(&self, query: &str, num_hops: usize, top_k: usize) -> RagResult {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("rag", %request_id, num_hops, top_k);
        self.run_hops(query, num_hops, top_k).instrument(span).await
    }

    async fn run_hops(&self, query: &str, num_hops: usize, top_k: usize) -> RagResult {
        if query.trim().is_empty() {
            tracing::warn!("Rejected empty query");
            return RagResult::failed(query, "empty query", Vec::new());
        }
        if num_hops == 0 {
            return RagResult::failed(query, "num_hops must be at least 1", Vec::new());
        }
        if top_k == 0 {
            return RagResult::failed(query, "top_k must be at least 1", Vec::new());
        }

        let mut state = HopState::new(query);

        for hop in 1..=num_hops {
            match self
                .retriever
                .retrieve_scored(state.expanded_query(), top_k)
                .await
            {
                Ok(hits) => {
                    tracing::debug!(
                        hop,
                        retrieved = hits.len(),
                        best_score = hits.first().map(|h| h.score).unwrap_or_default(),
                        "Hop complete"
                    );
                    state.record_hop(hits.into_iter().map(|hit| hit.text).collect());
                }
                Err(err) => {
                    tracing::error!(stage = "retrieve", hop, "Retrieval failed: {}", err);
                    return RagResult::failed(
                        query,
                        &format!("retrieval failed at hop {}: {}", hop, err),
                        state.into_documents(),
                    );
                }
            }
        }

        let prompt = build_prompt(state.original_query(), state.documents());
        tracing::debug!(
            documents = state.documents().len(),
            prompt_chars = prompt.len(),
            "Sending prompt to {}",
            self.llm.provider_name()
        );

        match self.llm.generate(&prompt).await {
            Ok(answer) => {
                tracing::info!(
                    hops = state.hops_completed(),
                    documents = state.documents().len(),
                    "Answer generated"
                );
                RagResult::answered(query, answer, state.into_documents())
            }
            Err(err) => {
                tracing::error!(stage = "generate", "Generation failed: {}", err);
                RagResult::failed(
                    query,
                    &format!("generation failed: {}", err),
                    state.into_documents(),
                )
            }
        }
    }
}
