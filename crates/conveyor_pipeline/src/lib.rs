//! The processor pipeline: composable content transforms with a uniform
//! result shape and a composite cache key.
//!
//! A processor is any [`Processor`] implementation: it receives the running
//! content plus accumulated metadata and returns nothing (no change), new
//! content, or content-plus-metadata updates. The pipeline composes N
//! processors right-to-left, mirroring nested function application.

#![warn(missing_docs)]

pub mod encoding;
pub mod error;
pub mod lazy;
pub mod pipeline;
pub mod processor;
pub mod registry;

pub use error::PipelineError;
pub use lazy::LazyProcessor;
pub use pipeline::{Pipeline, PipelineContext};
pub use processor::{
    FnProcessor, Metadata, MetadataUpdate, Processor, ProcessorError, ProcessorInput,
    ProcessorOutput,
};
pub use registry::ProcessorRegistry;
