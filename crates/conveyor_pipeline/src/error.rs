//! Error types for pipeline execution and transform lookup.

/// Errors that can occur while running or composing processor pipelines.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A processor failed; the whole pipeline aborts and no partial
    /// metadata is retained.
    #[error("processor '{name}' failed: {source}")]
    Stage {
        /// Name of the failing processor.
        name: String,
        /// The processor's own error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No chain of registered transformers converts between the two
    /// content types.
    #[error("no processor converts {from} to {to}")]
    Conversion {
        /// Source content type.
        from: String,
        /// Requested target content type.
        to: String,
    },

    /// A content encoding failed or is not supported.
    #[error("content encoding '{encoding}' failed: {reason}")]
    Encoding {
        /// The requested encoding.
        encoding: String,
        /// What went wrong.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_names_the_processor() {
        let err = PipelineError::Stage {
            name: "coffee".to_string(),
            source: "unexpected indent".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("coffee"));
        assert!(msg.contains("unexpected indent"));
    }

    #[test]
    fn conversion_error_display() {
        let err = PipelineError::Conversion {
            from: "text/plain".to_string(),
            to: "text/css".to_string(),
        };
        assert_eq!(err.to_string(), "no processor converts text/plain to text/css");
    }
}
