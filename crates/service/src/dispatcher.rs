use std::sync::Arc;

use annotate::{
    AnalysisEngine, ConversionError, Document, DocumentConverter, HeadFinder, HeadRules, Request,
    RequestType, Response,
};
use tracing::{debug, warn};

use crate::guard::AnalysisGuard;

#[derive(Debug)]
pub struct DispatchReport {
    pub response: Response,
    /// Documents returned as passthrough because their analysis failed
    pub degraded: usize,
}

/// Runs every document of a request through the shared engine and converter.
pub struct RequestDispatcher<E, H = HeadRules> {
    guard: Arc<AnalysisGuard<E>>,
    converter: DocumentConverter<H>,
}

impl<E: AnalysisEngine, H: HeadFinder> RequestDispatcher<E, H> {
    pub fn new(guard: Arc<AnalysisGuard<E>>, converter: DocumentConverter<H>) -> Self {
        Self { guard, converter }
    }

    pub fn guard(&self) -> &Arc<AnalysisGuard<E>> {
        &self.guard
    }

    /// Process a request synchronously.
    ///
    /// Never fails as a whole: a document whose analysis cannot be converted
    /// comes back as its input with tokens and sentences cleared. Never waits
    /// on an engine reload triggered by its own documents; see
    /// [`maybe_reload`](Self::maybe_reload).
    pub fn process(&self, request: Request) -> DispatchReport {
        let request_type = request.request_type;
        let count = request.documents.len();
        let mut degraded = 0;

        let documents = {
            let engine = self.guard.read();
            request
                .documents
                .into_iter()
                .map(|document| {
                    match self.process_document(&*engine, &document, request_type) {
                        Ok(converted) => converted,
                        Err(e) => {
                            warn!(
                                doc_id = %document.doc_id,
                                error = %e,
                                "Analysis unavailable, returning document unchanged"
                            );
                            degraded += 1;
                            document.passthrough()
                        }
                    }
                })
                .collect()
        };

        self.guard.record_processed(count);

        debug!(?request_type, documents = count, degraded, "Request processed");
        DispatchReport {
            response: Response {
                success: true,
                documents,
            },
            degraded,
        }
    }

    /// Reload the engine if the processed counter crossed the threshold.
    ///
    /// Blocks until every in-flight request releases shared access, so call
    /// it after the response has been handed back.
    pub fn maybe_reload(&self) -> bool {
        self.guard.reload_if_due()
    }

    fn process_document(
        &self,
        engine: &E,
        document: &Document,
        request_type: RequestType,
    ) -> Result<Document, ConversionError> {
        let analysis = engine.analyze(&document.text)?;
        self.converter.convert(document, &analysis, request_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::EngineLoader;
    use annotate::{Analysis, ConverterOptions};
    use engine::{BaselineEngine, EngineConfig};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn dispatcher(config: EngineConfig) -> RequestDispatcher<BaselineEngine> {
        let loader: EngineLoader<BaselineEngine> =
            Box::new(move || Ok(BaselineEngine::new(config.clone())));
        let guard = Arc::new(AnalysisGuard::new(loader, None).unwrap());
        RequestDispatcher::new(guard, DocumentConverter::new(ConverterOptions::default()))
    }

    fn request(request_type: RequestType, texts: &[&str]) -> Request {
        Request {
            request_type,
            documents: texts
                .iter()
                .enumerate()
                .map(|(i, text)| Document::new(format!("doc-{i}"), *text))
                .collect(),
        }
    }

    #[test]
    fn test_split_scenario() {
        let report = dispatcher(EngineConfig::default())
            .process(request(RequestType::Split, &["I saw her."]));
        assert!(report.response.success);
        assert_eq!(report.degraded, 0);

        let doc = &report.response.documents[0];
        let words: Vec<&str> = doc.tokens.iter().map(|t| t.word.as_str()).collect();
        assert_eq!(words, vec!["I", "saw", "her", "."]);
        let indices: Vec<usize> = doc.tokens.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(doc.tokens.iter().all(|t| t.pos.is_none() && t.lemma.is_none()));

        assert_eq!(doc.sentences.len(), 1);
        let sentence = &doc.sentences[0];
        assert_eq!((sentence.index, sentence.token_start, sentence.token_end), (0, 0, 3));
        assert!(sentence.constituents.is_empty());
    }

    #[test]
    fn test_parse_scenario() {
        let report = dispatcher(EngineConfig::default())
            .process(request(RequestType::Parse, &["I saw her."]));
        let doc = &report.response.documents[0];
        let sentence = &doc.sentences[0];

        let root = &sentence.constituents[0];
        assert_eq!(root.label, "S");
        assert_eq!(root.parent, 0);
        assert_eq!((root.char_start, root.char_end), (0, 9));

        let root_edges: Vec<_> = sentence
            .dependencies
            .iter()
            .filter(|d| d.relation == "root")
            .collect();
        assert_eq!(root_edges.len(), 1);
        assert_eq!(root_edges[0].gov_index, root_edges[0].dep_index);
        assert_eq!(doc.tokens[root_edges[0].gov_index].word, "saw");
        assert_eq!(doc.tokens[1].lemma.as_deref(), Some("see"));
    }

    #[test]
    fn test_documents_keep_request_order() {
        let report = dispatcher(EngineConfig::default())
            .process(request(RequestType::Split, &["One.", "Two.", "Three."]));

        let ids: Vec<&str> = report
            .response
            .documents
            .iter()
            .map(|d| d.doc_id.as_str())
            .collect();
        assert_eq!(ids, vec!["doc-0", "doc-1", "doc-2"]);
    }

    #[test]
    fn test_deadline_degrades_parse_only() {
        let expired = EngineConfig {
            max_parse_time: Some(Duration::ZERO),
        };

        let split = dispatcher(expired.clone()).process(request(RequestType::Split, &["I saw her."]));
        assert_eq!(split.degraded, 0);
        assert_eq!(split.response.documents[0].tokens.len(), 4);

        let parse = dispatcher(expired).process(request(RequestType::Parse, &["I saw her."]));
        assert!(parse.response.success);
        assert_eq!(parse.degraded, 1);
        let doc = &parse.response.documents[0];
        assert_eq!(doc.text, "I saw her.");
        assert!(doc.tokens.is_empty());
        assert!(doc.sentences.is_empty());
    }

    /// Engine that fails on any text containing "FAIL" and otherwise defers
    /// to the baseline engine.
    struct Flaky(BaselineEngine);

    impl AnalysisEngine for Flaky {
        fn analyze(&self, text: &str) -> anyhow::Result<Analysis> {
            if text.contains("FAIL") {
                anyhow::bail!("simulated engine failure");
            }
            let mut analysis = self.0.analyze(text)?;
            if text.contains("BROKEN") {
                // Dangling child in the tree of the first sentence
                if let Some(tree) = analysis.sentences[0].tree.as_mut() {
                    let root = tree.root();
                    let dangling = tree.len() + 10;
                    let extra = tree.add_node("X", vec![dangling]);
                    let mut children = tree.node(root).unwrap().children.clone();
                    children.push(extra);
                    let rebuilt = tree.add_node("S", children);
                    tree.set_root(rebuilt);
                }
            }
            Ok(analysis)
        }
    }

    #[test]
    fn test_failures_are_isolated_per_document() {
        let loader: EngineLoader<Flaky> =
            Box::new(|| Ok(Flaky(BaselineEngine::new(EngineConfig::default()))));
        let guard = Arc::new(AnalysisGuard::new(loader, None).unwrap());
        let dispatcher = RequestDispatcher::new(guard, DocumentConverter::new(ConverterOptions::default()));

        let mut req = request(
            RequestType::Parse,
            &["Fine text.", "FAIL here.", "BROKEN tree.", "Also fine."],
        );
        // Stale analysis on input is dropped on degradation too
        req.documents[1].tokens.push(annotate::Token::default());

        let report = dispatcher.process(req);
        assert!(report.response.success);
        assert_eq!(report.degraded, 2);

        let docs = &report.response.documents;
        assert_eq!(docs.len(), 4);
        assert!(!docs[0].tokens.is_empty());
        assert!(docs[1].tokens.is_empty() && docs[1].sentences.is_empty());
        assert_eq!(docs[1].text, "FAIL here.");
        assert!(docs[2].tokens.is_empty() && docs[2].sentences.is_empty());
        assert!(!docs[3].tokens.is_empty());
        assert_eq!(docs[3].tokens[0].index, 0);
    }

    #[test]
    fn test_processed_counter_and_reload() {
        let loader: EngineLoader<BaselineEngine> =
            Box::new(|| Ok(BaselineEngine::new(EngineConfig::default())));
        let guard = Arc::new(AnalysisGuard::new(loader, Some(3)).unwrap());
        let dispatcher = RequestDispatcher::new(Arc::clone(&guard), DocumentConverter::new(ConverterOptions::default()));

        dispatcher.process(request(RequestType::Split, &["a.", "b."]));
        assert_eq!(guard.processed(), 2);
        assert_eq!(guard.reloads(), 0);

        dispatcher.process(request(RequestType::Split, &["c.", "d."]));
        assert_eq!(guard.processed(), 4);
        assert_eq!(guard.reloads(), 0);

        assert!(dispatcher.maybe_reload());
        assert_eq!(guard.processed(), 0);
        assert_eq!(guard.reloads(), 1);
        assert!(!dispatcher.maybe_reload());
    }

    #[test]
    fn test_response_does_not_wait_for_reload() {
        let loader: EngineLoader<BaselineEngine> =
            Box::new(|| Ok(BaselineEngine::new(EngineConfig::default())));
        let guard = Arc::new(AnalysisGuard::new(loader, Some(1)).unwrap());
        let dispatcher = Arc::new(RequestDispatcher::new(
            Arc::clone(&guard),
            DocumentConverter::new(ConverterOptions::default()),
        ));

        // Another request still holds shared access to the engine
        let reader = guard.read();

        let (report_tx, report_rx) = mpsc::channel();
        let worker = {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                let report = dispatcher.process(request(RequestType::Split, &["I saw her."]));
                report_tx.send(report.response.documents.len()).unwrap();
                dispatcher.maybe_reload()
            })
        };

        assert_eq!(report_rx.recv_timeout(Duration::from_secs(2)), Ok(1));
        assert_eq!(guard.reloads(), 0);

        drop(reader);
        assert!(worker.join().unwrap());
        assert_eq!(guard.reloads(), 1);
    }

    #[test]
    fn test_deterministic() {
        let dispatcher = dispatcher(EngineConfig::default());
        let text = "The quick fox jumped. It ran into the woods!";

        let first = dispatcher.process(request(RequestType::Parse, &[text]));
        let second = dispatcher.process(request(RequestType::Parse, &[text]));
        assert_eq!(first.response.documents, second.response.documents);
    }

    #[test]
    fn test_concurrent_requests_with_reloads() {
        let loader: EngineLoader<BaselineEngine> =
            Box::new(|| Ok(BaselineEngine::new(EngineConfig::default())));
        let guard = Arc::new(AnalysisGuard::new(loader, Some(5)).unwrap());
        let dispatcher = Arc::new(RequestDispatcher::new(
            Arc::clone(&guard),
            DocumentConverter::new(ConverterOptions::default()),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let dispatcher = Arc::clone(&dispatcher);
                thread::spawn(move || {
                    (0..10)
                        .map(|_| {
                            let degraded = dispatcher
                                .process(request(RequestType::Parse, &["I saw her. She left."]))
                                .degraded;
                            dispatcher.maybe_reload();
                            degraded
                        })
                        .sum::<usize>()
                })
            })
            .collect();

        let degraded: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(degraded, 0);
        assert!(guard.reloads() > 0);
    }
}
