//! Functional composition of processors.

use std::path::Path;
use std::sync::Arc;

use conveyor_common::AssetUri;
use tracing::trace;

use crate::error::PipelineError;
use crate::processor::{Metadata, Processor, ProcessorInput, ProcessorOutput};

/// An ordered list of processors applied right-to-left.
///
/// The last-registered processor runs first, mirroring nested function
/// application `outer(inner(x))`: registering `[minify, compile]` compiles
/// first and minifies the result.
#[derive(Clone, Default)]
pub struct Pipeline {
    processors: Vec<Arc<dyn Processor>>,
}

/// Context shared by every stage of one pipeline run.
pub struct PipelineContext<'a> {
    /// Identity of the asset being built.
    pub uri: &'a AssetUri,
    /// Absolute path of the source file.
    pub filename: &'a Path,
    /// The load path the file was found under.
    pub load_path: Option<&'a Path>,
    /// Logical name of the asset.
    pub name: &'a str,
    /// Content type of the running data.
    pub content_type: Option<&'a str>,
}

impl Pipeline {
    /// Creates a pipeline over the given processors.
    pub fn new(processors: Vec<Arc<dyn Processor>>) -> Self {
        Self { processors }
    }

    /// Returns `true` if the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Runs every stage, threading content and metadata through.
    ///
    /// A failing stage aborts the whole run; the partially accumulated
    /// metadata never escapes.
    pub fn run(
        &self,
        ctx: &PipelineContext<'_>,
        data: String,
        metadata: Metadata,
    ) -> Result<(String, Metadata), PipelineError> {
        let mut data = data;
        let mut metadata = metadata;

        for processor in self.processors.iter().rev() {
            trace!(processor = processor.name(), "running pipeline stage");
            let input = ProcessorInput {
                uri: ctx.uri,
                filename: ctx.filename,
                load_path: ctx.load_path,
                name: ctx.name,
                content_type: ctx.content_type,
                data: &data,
                metadata: &metadata,
            };
            let output = processor.call(input).map_err(|e| PipelineError::Stage {
                name: processor.name().to_string(),
                source: e,
            })?;
            match output {
                ProcessorOutput::Unchanged => {}
                ProcessorOutput::Data(new_data) => data = new_data,
                ProcessorOutput::Update(update) => {
                    if let Some(new_data) = metadata.merge(update) {
                        data = new_data;
                    }
                }
            }
        }

        Ok((data, metadata))
    }

    /// The pipeline's composite cache key: the ordered list of every stage's
    /// name and cache-key contribution.
    ///
    /// The builder combines this with the source file's content digest, so
    /// an identical key seen before means the whole run can be skipped.
    pub fn cache_key(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.processors
                .iter()
                .map(|p| {
                    serde_json::json!([p.name(), p.cache_key().unwrap_or(serde_json::Value::Null)])
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{FnProcessor, MetadataUpdate, ProcessorError};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn ctx_fixture(uri: &AssetUri) -> PipelineContext<'_> {
        PipelineContext {
            uri,
            filename: Path::new("/srv/app.js"),
            load_path: Some(Path::new("/srv")),
            name: "app",
            content_type: Some("application/javascript"),
        }
    }

    fn upcase() -> Arc<dyn Processor> {
        Arc::new(FnProcessor::new("upcase", |input: ProcessorInput<'_>| {
            Ok(ProcessorOutput::Data(input.data.to_uppercase()))
        }))
    }

    fn suffix(tag: &'static str) -> Arc<dyn Processor> {
        Arc::new(FnProcessor::new(tag, move |input: ProcessorInput<'_>| {
            Ok(ProcessorOutput::Data(format!("{}{}", input.data, tag)))
        }))
    }

    #[test]
    fn stages_run_right_to_left() {
        let uri = AssetUri::from_filename("/srv/app.js");
        let pipeline = Pipeline::new(vec![suffix("outer"), suffix("inner")]);
        let (data, _) = pipeline
            .run(&ctx_fixture(&uri), "x".to_string(), Metadata::default())
            .unwrap();
        assert_eq!(data, "xinnerouter");
    }

    #[test]
    fn unchanged_output_keeps_data() {
        let uri = AssetUri::from_filename("/srv/app.js");
        let noop = Arc::new(FnProcessor::new("noop", |_: ProcessorInput<'_>| {
            Ok(ProcessorOutput::Unchanged)
        }));
        let pipeline = Pipeline::new(vec![noop, upcase()]);
        let (data, _) = pipeline
            .run(&ctx_fixture(&uri), "abc".to_string(), Metadata::default())
            .unwrap();
        assert_eq!(data, "ABC");
    }

    #[test]
    fn metadata_updates_accumulate() {
        let uri = AssetUri::from_filename("/srv/app.js");
        let tracker = Arc::new(FnProcessor::new("tracker", |_: ProcessorInput<'_>| {
            Ok(ProcessorOutput::Update(MetadataUpdate {
                data: None,
                dependency_paths: vec![PathBuf::from("/srv/helper.js")],
                cache_dependencies: vec![],
                extra: BTreeMap::from([("mapped".to_string(), serde_json::json!(true))]),
            }))
        }));
        let pipeline = Pipeline::new(vec![tracker]);
        let (data, meta) = pipeline
            .run(&ctx_fixture(&uri), "body".to_string(), Metadata::default())
            .unwrap();
        assert_eq!(data, "body");
        assert_eq!(meta.dependency_paths, vec![PathBuf::from("/srv/helper.js")]);
        assert_eq!(meta.extra["mapped"], serde_json::json!(true));
    }

    #[test]
    fn failing_stage_aborts_the_run() {
        let uri = AssetUri::from_filename("/srv/app.js");
        let boom = Arc::new(FnProcessor::new("boom", |_: ProcessorInput<'_>| {
            Err::<ProcessorOutput, ProcessorError>("syntax error".into())
        }));
        // boom is last-registered, so it runs first; upcase never runs.
        let pipeline = Pipeline::new(vec![upcase(), boom]);
        let err = pipeline
            .run(&ctx_fixture(&uri), "abc".to_string(), Metadata::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Stage { name, .. } if name == "boom"));
    }

    #[test]
    fn cache_key_lists_stages_in_order() {
        let keyed = Arc::new(
            FnProcessor::new("keyed", |_: ProcessorInput<'_>| Ok(ProcessorOutput::Unchanged))
                .with_cache_key(serde_json::json!(7)),
        );
        let pipeline = Pipeline::new(vec![upcase(), keyed]);
        assert_eq!(
            pipeline.cache_key(),
            serde_json::json!([["upcase", null], ["keyed", 7]])
        );
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let uri = AssetUri::from_filename("/srv/app.js");
        let pipeline = Pipeline::default();
        let (data, meta) = pipeline
            .run(&ctx_fixture(&uri), "same".to_string(), Metadata::default())
            .unwrap();
        assert_eq!(data, "same");
        assert_eq!(meta, Metadata::default());
    }
}
