//! Bootstrap seed data.
//!
//! On startup the daemon inserts two sample documents when the documents
//! table is empty, so a fresh install has something to edit immediately.
//! `draftd seed` wipes both tables and re-inserts them.

use super::Storage;
use anyhow::Result;
use tracing::info;

const DOCUMENT_1: &str = "Our new Coral Reef tote bag features a hand-drawn clownfish \
weaving through anemone tentacles, printed on heavyweight organic canvas. Each bag is \
illustrated from reference photos of real reef behavior, so the clownfish hides exactly \
the way it would in the wild. Machine washable, 40cm x 38cm, with an interior pocket \
sized for a paperback field guide.";

const DOCUMENT_2: &str = "Meet the artist behind our October calendar page! This month's \
illustration follows a giant Pacific octopus changing color as it crosses a kelp bed. \
Did you know an octopus has no rigid skeleton at all? Tag a friend who needs more \
cephalopods in their life.";

/// Insert the sample documents if the store is empty. Called at startup.
pub async fn seed_if_empty(storage: &Storage) -> Result<()> {
    if storage.count_documents().await? > 0 {
        return Ok(());
    }
    storage.insert_document_with_id(1, DOCUMENT_1).await?;
    storage.insert_document_with_id(2, DOCUMENT_2).await?;
    info!("seeded sample documents");
    Ok(())
}

/// Wipe all documents and versions, then re-insert the sample documents.
pub async fn reseed(storage: &Storage) -> Result<()> {
    sqlx::query("DELETE FROM versions").execute(&storage.pool()).await?;
    sqlx::query("DELETE FROM documents").execute(&storage.pool()).await?;
    storage.insert_document_with_id(1, DOCUMENT_1).await?;
    storage.insert_document_with_id(2, DOCUMENT_2).await?;
    info!("seed data inserted");
    Ok(())
}
