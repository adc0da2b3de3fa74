// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed vector index with exact cosine search.
//!
//! Documents live in one table keyed by `(collection, id)`, embeddings as
//! little-endian f32 BLOBs. Search embeds the query and scans the
//! collection linearly.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use mneme_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, HealthStatus, MnemeError, PluginAdapter,
    RetrievalAdapter, ScoredDocument, Turn,
};
use tokio_rusqlite::Connection;
use tracing::{debug, info, warn};

/// File name of the index database inside `index.database_location`.
pub const INDEX_FILE_NAME: &str = "index.sqlite3";

/// Documents embedded per request during a rebuild.
const REBUILD_BATCH_SIZE: usize = 32;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    PRIMARY KEY (collection, id)
);";

fn storage_err<E: std::fmt::Display>(e: E) -> MnemeError {
    MnemeError::Storage {
        source: format!("vector index: {e}").into(),
    }
}

/// Vector index over one named collection of a SQLite database.
pub struct VectorIndex {
    conn: Connection,
    collection: String,
    embedder: Arc<dyn EmbeddingAdapter>,
}

impl VectorIndex {
    /// Opens (creating if needed) `{database_location}/index.sqlite3`.
    pub async fn open(
        database_location: &Path,
        collection: &str,
        embedder: Arc<dyn EmbeddingAdapter>,
    ) -> Result<Self, MnemeError> {
        tokio::fs::create_dir_all(database_location)
            .await
            .map_err(|e| MnemeError::Storage {
                source: Box::new(e),
            })?;
        let path = database_location.join(INDEX_FILE_NAME);
        let conn = Connection::open(&path).await.map_err(storage_err)?;
        debug!(path = %path.display(), collection, "vector index opened");
        Self::with_connection(conn, collection, embedder).await
    }

    /// Opens a throwaway in-memory index.
    pub async fn open_in_memory(
        collection: &str,
        embedder: Arc<dyn EmbeddingAdapter>,
    ) -> Result<Self, MnemeError> {
        let conn = Connection::open_in_memory().await.map_err(storage_err)?;
        Self::with_connection(conn, collection, embedder).await
    }

    async fn with_connection(
        conn: Connection,
        collection: &str,
        embedder: Arc<dyn EmbeddingAdapter>,
    ) -> Result<Self, MnemeError> {
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(CREATE_TABLE)?;
            Ok(())
        })
        .await
        .map_err(storage_err)?;

        Ok(Self {
            conn,
            collection: collection.to_string(),
            embedder,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Number of documents in this collection.
    pub async fn count(&self) -> Result<usize, MnemeError> {
        let collection = self.collection.clone();
        self.conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                    rusqlite::params![collection],
                    |row| row.get::<_, i64>(0),
                )
                .map(|n| n as usize)
            })
            .await
            .map_err(storage_err)
    }

    async fn load_documents(&self) -> Result<Vec<(String, Vec<f32>)>, MnemeError> {
        let collection = self.collection.clone();
        self.conn
            .call(move |conn| -> Result<Vec<(String, Vec<f32>)>, rusqlite::Error> {
                let mut stmt = conn
                    .prepare("SELECT content, embedding FROM documents WHERE collection = ?1")?;
                let rows = stmt
                    .query_map(rusqlite::params![collection], |row| {
                        let content: String = row.get(0)?;
                        let blob: Vec<u8> = row.get(1)?;
                        Ok((content, blob_to_vec(&blob)))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(storage_err)
    }
}

#[async_trait]
impl PluginAdapter for VectorIndex {
    fn name(&self) -> &str {
        "sqlite-index"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Retrieval
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemeError> {
        match self
            .conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
        {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), MnemeError> {
        debug!("vector index shutting down");
        Ok(())
    }
}

#[async_trait]
impl RetrievalAdapter for VectorIndex {
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, MnemeError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let documents = self.load_documents().await?;
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: vec![query.to_string()],
            })
            .await?;
        let Some(query_vec) = output.embeddings.into_iter().next() else {
            return Err(MnemeError::Embedding {
                message: "embedder returned no vector for query".into(),
                source: None,
            });
        };

        let mut scored: Vec<ScoredDocument> = documents
            .into_iter()
            .filter_map(|(content, embedding)| {
                if embedding.len() != query_vec.len() {
                    warn!(
                        expected = query_vec.len(),
                        found = embedding.len(),
                        "skipping document with mismatched embedding size"
                    );
                    return None;
                }
                let distance = 1.0 - cosine_similarity(&query_vec, &embedding);
                Some(ScoredDocument::new(content, distance))
            })
            .collect();

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);
        Ok(scored)
    }

    async fn add(&self, texts: Vec<String>, ids: Vec<String>) -> Result<(), MnemeError> {
        if texts.len() != ids.len() {
            return Err(MnemeError::retrieval(format!(
                "add called with {} texts but {} ids",
                texts.len(),
                ids.len()
            )));
        }
        if texts.is_empty() {
            return Ok(());
        }

        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: texts.clone(),
            })
            .await?;
        if output.embeddings.len() != texts.len() {
            return Err(MnemeError::Embedding {
                message: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    output.embeddings.len()
                ),
                source: None,
            });
        }

        let collection = self.collection.clone();
        let rows: Vec<(String, String, Vec<u8>)> = ids
            .into_iter()
            .zip(texts)
            .zip(output.embeddings)
            .map(|((id, text), embedding)| (id, text, vec_to_blob(&embedding)))
            .collect();
        let added = rows.len();

        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT OR REPLACE INTO documents (collection, id, content, embedding) VALUES (?1, ?2, ?3, ?4)",
                    )?;
                    for (id, content, blob) in &rows {
                        stmt.execute(rusqlite::params![collection, id, content, blob])?;
                    }
                }
                tx.commit()
            })
            .await
            .map_err(storage_err)?;

        debug!(added, collection = %self.collection, "documents indexed");
        Ok(())
    }

    /// Removes every document in this collection. Other collections sharing
    /// the database file are untouched.
    async fn reset(&self) -> Result<(), MnemeError> {
        let collection = self.collection.clone();
        let removed = self
            .conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "DELETE FROM documents WHERE collection = ?1",
                    rusqlite::params![collection],
                )
            })
            .await
            .map_err(storage_err)?;
        debug!(removed, collection = %self.collection, "vector index reset");
        Ok(())
    }
}

/// Reset `index` and re-add every persisted turn.
///
/// Each turn becomes the document `"{prompt} {response}"` under id
/// `"{turn.id}"`. Returns the number of documents added.
pub async fn rebuild_index(index: &dyn RetrievalAdapter, turns: &[Turn]) -> Result<usize, MnemeError> {
    index.reset().await?;

    for batch in turns.chunks(REBUILD_BATCH_SIZE) {
        let texts = batch.iter().map(Turn::document_text).collect();
        let ids = batch.iter().map(|turn| turn.id.to_string()).collect();
        index.add(texts, ids).await?;
    }

    info!(documents = turns.len(), "vector index rebuilt from history");
    Ok(turns.len())
}

/// Convert an f32 vector to a little-endian BLOB.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a BLOB back to an f32 vector. Trailing partial bytes are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity; zero when either vector has no magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
