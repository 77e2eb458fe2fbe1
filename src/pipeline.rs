//! Photo → text → translation flow.
//! Cache first; on a miss the remote service is called (only when online),
//! and the result is cached and recorded in history.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::history::NewHistoryEntry;
use crate::remote::{OcrAnalysis, RemoteError, TranslationOutcome, VisionTranslator};
use crate::store::TranslationStore;

/// Result of translating one piece of text.
#[derive(Debug, Clone)]
pub struct TextTranslation {
    pub source_text: String,
    pub outcome: TranslationOutcome,
    /// Served from the local cache without a remote call.
    pub cached: bool,
    pub elapsed_ms: f64,
}

/// Result of processing one photo.
#[derive(Debug, Clone)]
pub struct ImageTranslation {
    pub analysis: OcrAnalysis,
    pub translation: TextTranslation,
}

pub struct TranslationPipeline {
    store: TranslationStore,
    service: Arc<dyn VisionTranslator>,
}

impl TranslationPipeline {
    pub fn new(store: TranslationStore, service: Arc<dyn VisionTranslator>) -> Self {
        Self { store, service }
    }

    pub fn store(&self) -> &TranslationStore {
        &self.store
    }

    /// Translate `text` with the store's current language pair.
    pub async fn translate_text(&self, text: &str) -> Result<TextTranslation, RemoteError> {
        let start = Instant::now();
        let text = text.trim();
        if text.is_empty() {
            return Err(RemoteError::InvalidInput("empty text".into()));
        }

        let from = self.store.from_language();
        let to = self.store.to_language();

        let (outcome, cached) =
            match self.store.get_cached_translation(text, &from.code, &to.code) {
                Some(hit) => {
                    debug!(from = %from.code, to = %to.code, "translation cache hit");
                    (TranslationOutcome::plain(&hit), true)
                }
                None => {
                    if !self.store.is_online() {
                        return Err(RemoteError::Offline);
                    }
                    let outcome = self
                        .service
                        .translate(text, &from, &to)
                        .await
                        .inspect_err(|e| log_remote_failure("translate", e))?;
                    self.store
                        .add_to_cache(text, &outcome.primary, &from.code, &to.code);
                    (outcome, false)
                }
            };

        self.store.add_to_history(NewHistoryEntry::new(
            text,
            outcome.primary.clone(),
            from.name.clone(),
            to.name.clone(),
        ));

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(cached, elapsed_ms, from = %from.code, to = %to.code, "text translated");

        Ok(TextTranslation {
            source_text: text.to_string(),
            outcome,
            cached,
            elapsed_ms,
        })
    }

    /// Extract text from a photo and translate it.
    pub async fn process_image(&self, image: &[u8]) -> Result<ImageTranslation, RemoteError> {
        if !self.store.is_online() {
            return Err(RemoteError::Offline);
        }
        let analysis = self
            .service
            .analyze_image(image)
            .await
            .inspect_err(|e| log_remote_failure("analyze_image", e))?;
        if !analysis.has_text() {
            return Err(RemoteError::NoTextFound);
        }
        debug!(
            confidence = analysis.confidence,
            context = %analysis.context_type,
            corrections = analysis.corrections.len(),
            "image analyzed"
        );
        let translation = self.translate_text(analysis.extracted_text()).await?;
        Ok(ImageTranslation {
            analysis,
            translation,
        })
    }
}

fn log_remote_failure(call: &'static str, e: &RemoteError) {
    warn!(call, error = %e, retryable = e.is_retryable(), "remote call failed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::language::Language;
    use crate::network::ManualReachability;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeService {
        ocr_text: String,
        translations: AtomicUsize,
    }

    impl FakeService {
        fn new(ocr_text: &str) -> Arc<Self> {
            Arc::new(Self {
                ocr_text: ocr_text.to_string(),
                translations: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl VisionTranslator for FakeService {
        async fn analyze_image(&self, _image: &[u8]) -> Result<OcrAnalysis, RemoteError> {
            Ok(OcrAnalysis::plain(&self.ocr_text))
        }

        async fn translate(
            &self,
            text: &str,
            _from: &Language,
            to: &Language,
        ) -> Result<TranslationOutcome, RemoteError> {
            self.translations.fetch_add(1, Ordering::SeqCst);
            Ok(TranslationOutcome::plain(&format!("[{}] {}", to.code, text)))
        }
    }

    struct DownService;

    #[async_trait]
    impl VisionTranslator for DownService {
        async fn analyze_image(&self, _image: &[u8]) -> Result<OcrAnalysis, RemoteError> {
            Err(RemoteError::Http { status: 503 })
        }

        async fn translate(
            &self,
            _text: &str,
            _from: &Language,
            _to: &Language,
        ) -> Result<TranslationOutcome, RemoteError> {
            Err(RemoteError::Timeout)
        }
    }

    async fn pipeline(service: Arc<dyn VisionTranslator>) -> TranslationPipeline {
        let store =
            TranslationStore::open(Arc::new(MemoryStore::new()), StoreConfig::default()).await;
        store.set_from_language(Language::new("fr", "French"));
        store.set_to_language(Language::new("en", "English"));
        TranslationPipeline::new(store, service)
    }

    #[tokio::test]
    async fn second_translation_is_served_from_cache() {
        let service = FakeService::new("");
        let pipeline = pipeline(service.clone()).await;

        let first = pipeline.translate_text("Bonjour").await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.outcome.primary, "[en] Bonjour");

        let second = pipeline.translate_text(" bonjour ").await.unwrap();
        assert!(second.cached);
        assert_eq!(second.outcome.primary, "[en] Bonjour");
        assert_eq!(service.translations.load(Ordering::SeqCst), 1);

        let history = pipeline.store().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].from_language, "French");
        assert_eq!(history[0].to_language, "English");
    }

    #[tokio::test]
    async fn offline_miss_fails_but_hit_succeeds() {
        let service = FakeService::new("");
        let pipeline = pipeline(service.clone()).await;
        pipeline.translate_text("Merci").await.unwrap();

        let reach = ManualReachability::new(false);
        pipeline.store().attach_reachability(&reach);

        assert!(pipeline.translate_text("Merci").await.unwrap().cached);
        assert!(matches!(
            pipeline.translate_text("Au revoir").await,
            Err(RemoteError::Offline)
        ));
        assert_eq!(service.translations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn image_flow_uses_extracted_text() {
        let service = FakeService::new("Sortie");
        let pipeline = pipeline(service).await;
        let result = pipeline.process_image(b"jpeg-bytes").await.unwrap();
        assert_eq!(result.analysis.extracted_text(), "Sortie");
        assert_eq!(result.translation.outcome.primary, "[en] Sortie");
    }

    #[tokio::test]
    async fn image_without_text_is_reported() {
        let pipeline = pipeline(FakeService::new("NO_TEXT_FOUND")).await;
        assert!(matches!(
            pipeline.process_image(b"jpeg-bytes").await,
            Err(RemoteError::NoTextFound)
        ));
        assert!(pipeline.store().history().is_empty());
    }

    #[tokio::test]
    async fn service_failure_leaves_store_untouched() {
        let pipeline = pipeline(Arc::new(DownService)).await;
        let err = pipeline.translate_text("Bonjour").await.unwrap_err();
        assert!(matches!(err, RemoteError::Timeout));
        assert!(matches!(
            pipeline.process_image(b"jpeg-bytes").await,
            Err(RemoteError::Http { status: 503 })
        ));
        assert!(pipeline.store().history().is_empty());
        assert!(pipeline.store().cache_entries().is_empty());
    }

    #[tokio::test]
    async fn blank_text_is_invalid() {
        let pipeline = pipeline(FakeService::new("")).await;
        assert!(matches!(
            pipeline.translate_text("   ").await,
            Err(RemoteError::InvalidInput(_))
        ));
    }
}
