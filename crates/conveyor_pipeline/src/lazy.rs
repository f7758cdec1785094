//! Lazily initialized processors.
//!
//! Optional converters may depend on tooling that is not always present.
//! A [`LazyProcessor`] holds a deferred initializer that runs at most once,
//! on first invocation, so an unavailable optional dependency only fails
//! when the processor is actually used.

use std::sync::{Arc, Mutex, OnceLock};

use crate::processor::{Processor, ProcessorError, ProcessorInput, ProcessorOutput};

/// Initializer for a lazy processor.
pub type LazyInit =
    Box<dyn FnOnce() -> Result<Arc<dyn Processor>, String> + Send>;

/// A processor whose construction is deferred until first use.
pub struct LazyProcessor {
    name: String,
    init: Mutex<Option<LazyInit>>,
    cell: OnceLock<Result<Arc<dyn Processor>, String>>,
}

impl LazyProcessor {
    /// Wraps an initializer under the given processor name.
    pub fn new(
        name: impl Into<String>,
        init: impl FnOnce() -> Result<Arc<dyn Processor>, String> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            init: Mutex::new(Some(Box::new(init))),
            cell: OnceLock::new(),
        }
    }

    fn force(&self) -> Result<&Arc<dyn Processor>, ProcessorError> {
        let result = self.cell.get_or_init(|| {
            let init = self
                .init
                .lock()
                .expect("lazy processor initializer lock poisoned")
                .take()
                .expect("lazy processor initializer already consumed");
            init()
        });
        match result {
            Ok(processor) => Ok(processor),
            Err(reason) => Err(format!("processor '{}' unavailable: {reason}", self.name).into()),
        }
    }
}

impl Processor for LazyProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, input: ProcessorInput<'_>) -> Result<ProcessorOutput, ProcessorError> {
        self.force()?.call(input)
    }

    fn cache_key(&self) -> Option<serde_json::Value> {
        // Forcing here would defeat laziness; the name identifies the stage
        // until the processor has been initialized.
        self.cell
            .get()
            .and_then(|r| r.as_ref().ok())
            .and_then(|p| p.cache_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::FnProcessor;
    use conveyor_common::AssetUri;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn input_fixture<'a>(
        uri: &'a AssetUri,
        meta: &'a crate::processor::Metadata,
    ) -> ProcessorInput<'a> {
        ProcessorInput {
            uri,
            filename: Path::new("/srv/app.js"),
            load_path: None,
            name: "app",
            content_type: None,
            data: "x",
            metadata: meta,
        }
    }

    #[test]
    fn initializer_runs_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let lazy = LazyProcessor::new("lazy", || {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(FnProcessor::new("inner", |_: ProcessorInput<'_>| {
                Ok(ProcessorOutput::Data("ran".to_string()))
            })) as Arc<dyn Processor>)
        });

        let uri = AssetUri::from_filename("/srv/app.js");
        let meta = crate::processor::Metadata::default();
        for _ in 0..3 {
            let out = lazy.call(input_fixture(&uri, &meta)).unwrap();
            assert!(matches!(out, ProcessorOutput::Data(d) if d == "ran"));
        }
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unavailable_processor_fails_only_when_invoked() {
        let lazy = LazyProcessor::new("sassc", || Err("sassc not installed".to_string()));
        // Construction and naming are fine.
        assert_eq!(lazy.name(), "sassc");

        let uri = AssetUri::from_filename("/srv/app.css");
        let meta = crate::processor::Metadata::default();
        let err = lazy.call(input_fixture(&uri, &meta)).unwrap_err();
        assert!(err.to_string().contains("sassc not installed"));
    }
}
