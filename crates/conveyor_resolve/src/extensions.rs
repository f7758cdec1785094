//! Splitting basenames into name, format extension, and engine extensions.

use crate::mime::{EngineRegistry, MimeRegistry};

/// The result of parsing a basename's extension tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBasename {
    /// Basename with all recognized extensions removed.
    pub name: String,

    /// The format (mime) extension, without the leading dot.
    pub format_ext: Option<String>,

    /// Engine extensions in outer-first order (rightmost token first).
    pub engine_exts: Vec<String>,
}

impl ParsedBasename {
    /// The content type this basename will have after its engine chain runs.
    ///
    /// The format extension wins if present; otherwise the innermost engine's
    /// target type applies.
    pub fn content_type<'a>(
        &'a self,
        mimes: &'a MimeRegistry,
        engines: &'a EngineRegistry,
    ) -> Option<&'a str> {
        if let Some(ext) = &self.format_ext {
            return mimes.content_type_for(ext);
        }
        self.engine_exts
            .last()
            .and_then(|ext| engines.target_type(ext))
    }
}

/// Splits a basename by scanning its extension tokens right-to-left.
///
/// Trailing tokens matching a known engine are peeled off outer-first until a
/// token matches a format extension or none do. Unrecognized tokens stay part
/// of the name, so `jquery.min.js` keeps its `.min`.
pub fn parse_basename(
    basename: &str,
    mimes: &MimeRegistry,
    engines: &EngineRegistry,
) -> ParsedBasename {
    let mut tokens: Vec<&str> = basename.split('.').collect();
    let mut engine_exts = Vec::new();
    let mut format_ext = None;

    // The first token is the bare name, never an extension.
    while tokens.len() > 1 {
        let last = tokens[tokens.len() - 1];
        if engines.is_engine_ext(last) {
            engine_exts.push(last.to_string());
            tokens.pop();
        } else if mimes.is_format_ext(last) {
            format_ext = Some(last.to_string());
            tokens.pop();
            break;
        } else {
            break;
        }
    }

    ParsedBasename {
        name: tokens.join("."),
        format_ext,
        engine_exts,
    }
}
