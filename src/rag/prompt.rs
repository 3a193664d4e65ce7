use super::types::Document;

/// Separator between documents in the prompt context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

const INSTRUCTIONS: &str = "Think step by step and provide an answer. \
If you cannot get an answer from the context, respond with 'I don't know'.";

pub fn build_context(documents: &[Document]) -> String {
    documents.join(CONTEXT_SEPARATOR)
}

/// Reasoning-style prompt: the question, the retrieved context, then the
/// answering instructions.
pub fn build_prompt(query: &str, documents: &[Document]) -> String {
    format!(
        "Question: {}\n\nContext:\n{}\n\n{}",
        query,
        build_context(documents),
        INSTRUCTIONS
    )
}
