use std::fs;
use std::path::Path;

use super::error::CorpusError;
use super::types::Document;

/// Ordered, read-only document collection. Document `i` corresponds to
/// vector `i` in the index.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Loads a JSON array of strings.
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let contents = fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let documents: Vec<Document> =
            serde_json::from_str(&contents).map_err(|source| CorpusError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!("Loaded {} documents from {}", documents.len(), path.display());
        Ok(Self { documents })
    }

    pub fn get(&self, id: usize) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_documents_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acts.json");
        fs::write(
            &path,
            r#"["Theft is punishable by up to 3 years imprisonment.", "Fraud is a felony."]"#,
        )
        .unwrap();

        let store = DocumentStore::load(&path).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).map(String::as_str), Some("Fraud is a felony."));
        assert!(store.get(2).is_none());
    }

    #[test]
    fn non_string_entries_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acts.json");
        fs::write(&path, r#"[{"text": "x"}]"#).unwrap();

        assert!(matches!(
            DocumentStore::load(&path),
            Err(CorpusError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DocumentStore::load(&dir.path().join("missing.json")),
            Err(CorpusError::Io { .. })
        ));
    }
}
