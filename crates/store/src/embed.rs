//! Embedding calls shared by the backends.

use document::Document;
use embedding::EmbeddingModel;
use usage::Usage;

use crate::VectorStoreError;

/// Reject caller-supplied embeddings whose length disagrees with the model or
/// with each other. Runs before any provider call.
pub(crate) fn check_supplied_dimensions(
    model: &dyn EmbeddingModel,
    documents: &[Document],
) -> Result<(), VectorStoreError> {
    check_embedding_lengths(model.dimensions(), documents)
}

/// Same check against a known (or still unknown) store dimensionality.
pub(crate) fn check_embedding_lengths(
    mut expected: Option<usize>,
    documents: &[Document],
) -> Result<(), VectorStoreError> {
    for doc in documents {
        let Some(embedding) = doc.embedding() else {
            continue;
        };
        match expected {
            Some(dims) if dims != embedding.len() => {
                return Err(VectorStoreError::invalid(format!(
                    "document '{}' has a {}-dimensional embedding, store expects {dims}",
                    doc.id(),
                    embedding.len()
                )));
            }
            Some(_) => {}
            None => expected = Some(embedding.len()),
        }
    }
    Ok(())
}

/// Reject empty ids up front.
pub(crate) fn check_ids(ids: &[String]) -> Result<(), VectorStoreError> {
    if ids.iter().any(|id| id.is_empty()) {
        return Err(VectorStoreError::invalid("document ids must not be empty"));
    }
    Ok(())
}

/// Embed every document that has no embedding yet, in one provider batch.
pub(crate) async fn embed_missing(
    model: &dyn EmbeddingModel,
    documents: Vec<Document>,
) -> Result<(Vec<Document>, Usage), VectorStoreError> {
    let texts: Vec<String> = documents
        .iter()
        .filter(|doc| doc.embedding().is_none())
        .map(|doc| doc.content().to_string())
        .collect();
    if texts.is_empty() {
        return Ok((documents, Usage::empty()));
    }

    let response = model.embed_batch(&texts).await?;
    if response.vectors.len() != texts.len() {
        return Err(VectorStoreError::MalformedResponse(format!(
            "requested {} embeddings, provider returned {}",
            texts.len(),
            response.vectors.len()
        )));
    }

    let mut vectors = response.vectors.into_iter();
    let mut embedded = Vec::with_capacity(documents.len());
    for doc in documents {
        if doc.embedding().is_some() {
            embedded.push(doc);
            continue;
        }
        match vectors.next() {
            Some(vector) => embedded.push(doc.into_embedded(vector)),
            None => {
                return Err(VectorStoreError::MalformedResponse(
                    "provider returned fewer embeddings than requested".into(),
                ))
            }
        }
    }
    Ok((embedded, response.usage))
}

/// Embed the query text of a search.
pub(crate) async fn embed_query(
    model: &dyn EmbeddingModel,
    text: &str,
) -> Result<(Vec<f32>, Usage), VectorStoreError> {
    let response = model.embed_batch(&[text.to_string()]).await?;
    let vector = response.vectors.into_iter().next().ok_or_else(|| {
        VectorStoreError::MalformedResponse("provider returned no query embedding".into())
    })?;
    Ok((vector, response.usage))
}
