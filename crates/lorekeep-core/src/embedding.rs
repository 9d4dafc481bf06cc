use crate::error::{Error, Result};
use crate::traits::Embedder;

/// Stand-in for empty inputs; some providers reject empty strings.
pub const EMPTY_PLACEHOLDER: &str = " ";

/// Embed `texts` through `embedder` in batches of `batch_size`.
///
/// Blank inputs are replaced by [`EMPTY_PLACEHOLDER`]. The provider must
/// return one vector per input, all of `embedder.dim()` length.
pub fn embed_texts(embedder: &dyn Embedder, texts: &[String], batch_size: usize) -> Result<Vec<Vec<f32>>> {
    let batch_size = batch_size.max(1);
    let inputs: Vec<String> = texts
        .iter()
        .map(|t| if t.trim().is_empty() { EMPTY_PLACEHOLDER.to_string() } else { t.clone() })
        .collect();
    let mut out = Vec::with_capacity(inputs.len());
    for batch in inputs.chunks(batch_size) {
        let vectors = embedder.embed_batch(batch)?;
        if vectors.len() != batch.len() {
            return Err(Error::Provider(format!(
                "embedder '{}' returned {} vectors for {} inputs",
                embedder.id(),
                vectors.len(),
                batch.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != embedder.dim()) {
            return Err(Error::Provider(format!(
                "embedder '{}' returned a {}-dim vector, expected {}",
                embedder.id(),
                bad.len(),
                embedder.dim()
            )));
        }
        out.extend(vectors);
    }
    Ok(out)
}

/// Embed a single query string.
pub fn embed_query(embedder: &dyn Embedder, query: &str) -> Result<Vec<f32>> {
    embed_texts(embedder, &[query.to_string()], 1)?
        .pop()
        .ok_or_else(|| Error::Provider(format!("embedder '{}' returned no vector", embedder.id())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        seen: Mutex<Vec<String>>,
        dim: usize,
    }

    impl Embedder for Recording {
        fn id(&self) -> &str { "recording" }
        fn dim(&self) -> usize { self.dim }
        fn max_len(&self) -> usize { 16 }
        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.seen.lock().expect("lock").extend(texts.iter().cloned());
            Ok(texts.iter().map(|_| vec![1.0; 2]).collect())
        }
    }

    #[test]
    fn blank_inputs_use_placeholder() {
        let e = Recording { seen: Mutex::new(Vec::new()), dim: 2 };
        let out = embed_texts(&e, &["a".into(), "".into(), "  ".into()], 2).expect("embed");
        assert_eq!(out.len(), 3);
        assert_eq!(*e.seen.lock().expect("lock"), vec!["a".to_string(), " ".to_string(), " ".to_string()]);
    }

    #[test]
    fn dimension_mismatch_is_provider_error() {
        let e = Recording { seen: Mutex::new(Vec::new()), dim: 3 };
        let err = embed_query(&e, "q").expect_err("dims differ");
        assert!(matches!(err, Error::Provider(_)));
    }
}
