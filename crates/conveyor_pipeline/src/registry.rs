//! Registration of processors per content type.
//!
//! Registries are copy-on-write values: every registration produces a new
//! registry, so a build holding a snapshot never observes mutation.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use crate::error::PipelineError;
use crate::processor::Processor;

/// Ordered processor lists per content type, plus the cross-type
/// transformer table and engine implementations.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    preprocessors: BTreeMap<String, Vec<Arc<dyn Processor>>>,
    postprocessors: BTreeMap<String, Vec<Arc<dyn Processor>>>,
    bundle_processors: BTreeMap<String, Vec<Arc<dyn Processor>>>,
    transformers: BTreeMap<(String, String), Arc<dyn Processor>>,
    engines: BTreeMap<String, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with a preprocessor appended for the content type.
    pub fn register_preprocessor(
        mut self,
        content_type: &str,
        processor: Arc<dyn Processor>,
    ) -> Self {
        self.preprocessors
            .entry(content_type.to_string())
            .or_default()
            .push(processor);
        self
    }

    /// Returns a copy with a postprocessor appended for the content type.
    pub fn register_postprocessor(
        mut self,
        content_type: &str,
        processor: Arc<dyn Processor>,
    ) -> Self {
        self.postprocessors
            .entry(content_type.to_string())
            .or_default()
            .push(processor);
        self
    }

    /// Returns a copy with a bundle processor appended for the content type.
    pub fn register_bundle_processor(
        mut self,
        content_type: &str,
        processor: Arc<dyn Processor>,
    ) -> Self {
        self.bundle_processors
            .entry(content_type.to_string())
            .or_default()
            .push(processor);
        self
    }

    /// Returns a copy with a transformer registered from one content type to
    /// another.
    pub fn register_transformer(
        mut self,
        from: &str,
        to: &str,
        processor: Arc<dyn Processor>,
    ) -> Self {
        self.transformers
            .insert((from.to_string(), to.to_string()), processor);
        self
    }

    /// Returns a copy with an engine implementation registered for an
    /// engine extension.
    pub fn register_engine(mut self, ext: &str, processor: Arc<dyn Processor>) -> Self {
        self.engines
            .insert(ext.trim_start_matches('.').to_string(), processor);
        self
    }

    /// Preprocessors for a content type, in registration order.
    pub fn preprocessors(&self, content_type: &str) -> &[Arc<dyn Processor>] {
        self.preprocessors
            .get(content_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Postprocessors for a content type, in registration order.
    pub fn postprocessors(&self, content_type: &str) -> &[Arc<dyn Processor>] {
        self.postprocessors
            .get(content_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Bundle processors for a content type, in registration order.
    pub fn bundle_processors(&self, content_type: &str) -> &[Arc<dyn Processor>] {
        self.bundle_processors
            .get(content_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The engine implementation for an extension, if registered.
    pub fn engine(&self, ext: &str) -> Option<&Arc<dyn Processor>> {
        self.engines.get(ext.trim_start_matches('.'))
    }

    /// Finds the shortest transformer chain converting `from` to `to`.
    ///
    /// A breadth-first search over the transformer edges; an empty chain
    /// means the types already match. Fails with a conversion error when no
    /// chain exists.
    pub fn transform_chain(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Vec<Arc<dyn Processor>>, PipelineError> {
        if from == to {
            return Ok(Vec::new());
        }

        let mut queue = VecDeque::from([from.to_string()]);
        let mut came_from: BTreeMap<String, (String, Arc<dyn Processor>)> = BTreeMap::new();

        while let Some(current) = queue.pop_front() {
            for ((edge_from, edge_to), processor) in &self.transformers {
                if *edge_from != current || came_from.contains_key(edge_to) || edge_to == from {
                    continue;
                }
                came_from.insert(edge_to.clone(), (current.clone(), Arc::clone(processor)));
                if edge_to == to {
                    let mut chain = Vec::new();
                    let mut step = to.to_string();
                    while step != from {
                        let (prev, processor) = came_from[&step].clone();
                        chain.push(processor);
                        step = prev;
                    }
                    chain.reverse();
                    return Ok(chain);
                }
                queue.push_back(edge_to.clone());
            }
        }

        Err(PipelineError::Conversion {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{FnProcessor, ProcessorInput, ProcessorOutput};

    fn noop(name: &'static str) -> Arc<dyn Processor> {
        Arc::new(FnProcessor::new(name, |_: ProcessorInput<'_>| {
            Ok(ProcessorOutput::Unchanged)
        }))
    }

    #[test]
    fn registration_is_copy_on_write() {
        let base = ProcessorRegistry::new();
        let extended = base
            .clone()
            .register_preprocessor("application/javascript", noop("directive"));
        assert!(base.preprocessors("application/javascript").is_empty());
        assert_eq!(extended.preprocessors("application/javascript").len(), 1);
    }

    #[test]
    fn processors_keep_registration_order() {
        let registry = ProcessorRegistry::new()
            .register_preprocessor("text/css", noop("first"))
            .register_preprocessor("text/css", noop("second"));
        let names: Vec<&str> = registry
            .preprocessors("text/css")
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn direct_transform_chain() {
        let registry =
            ProcessorRegistry::new().register_transformer("text/scss", "text/css", noop("scss"));
        let chain = registry.transform_chain("text/scss", "text/css").unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].name(), "scss");
    }

    #[test]
    fn multi_step_transform_chain() {
        let registry = ProcessorRegistry::new()
            .register_transformer("a/a", "b/b", noop("ab"))
            .register_transformer("b/b", "c/c", noop("bc"));
        let chain = registry.transform_chain("a/a", "c/c").unwrap();
        let names: Vec<&str> = chain.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["ab", "bc"]);
    }

    #[test]
    fn identity_transform_is_empty() {
        let registry = ProcessorRegistry::new();
        assert!(registry.transform_chain("text/css", "text/css").unwrap().is_empty());
    }

    #[test]
    fn missing_transform_is_conversion_error() {
        let registry = ProcessorRegistry::new();
        // The Ok side holds trait objects without Debug, so take the error
        // out by hand instead of unwrap_err.
        let err = registry
            .transform_chain("text/plain", "text/css")
            .err()
            .expect("no transformer is registered");
        assert!(matches!(err, PipelineError::Conversion { .. }));
    }

    #[test]
    fn engine_lookup_ignores_leading_dot() {
        let registry = ProcessorRegistry::new().register_engine(".coffee", noop("coffee"));
        assert!(registry.engine("coffee").is_some());
        assert!(registry.engine(".coffee").is_some());
        assert!(registry.engine("scss").is_none());
    }
}
