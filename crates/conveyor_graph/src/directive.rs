//! Header scanning and the directive table.
//!
//! Directives live in a file's leading comment block as lines of the form
//! `<comment-marker>= <name> <arg>`, e.g. `//= require ./lib`. The block
//! ends at the first line that is neither blank nor a comment. Directive
//! lines are removed from the source that continues down the pipeline.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// One recognized directive with its argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// Concatenate the named asset before this file.
    Require(String),

    /// Require every file in the named directory, non-recursive, sorted.
    RequireDirectory(String),

    /// Require every file under the named directory, recursive, sorted.
    RequireTree(String),

    /// Record a dependency without concatenating its content.
    Depend(String),

    /// Exclude the named asset and everything reachable only through it.
    Stub(String),

    /// Inline the named asset at this position without deduplication.
    Include(String),

    /// Declares that this file provides the named asset. No-op.
    Provide(String),

    /// Toggles legacy directive compatibility for this file.
    Compat,
}

/// A source file split into its directives and remaining content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSource {
    /// Directives in declaration order, with one-based line numbers.
    pub directives: Vec<(usize, Directive)>,

    /// The source with directive lines removed.
    pub stripped: String,
}

/// Builds a directive from its name and optional argument.
///
/// This is the explicit name-to-handler table: unknown names fail here, at
/// parse time, rather than at some later dispatch.
fn build_directive(name: &str, arg: Option<String>, line: usize) -> Result<Directive, GraphError> {
    let require_arg = |arg: Option<String>| {
        arg.ok_or_else(|| GraphError::MissingArgument {
            name: name.to_string(),
            line,
        })
    };

    match name {
        "require" => Ok(Directive::Require(require_arg(arg)?)),
        "require_directory" => Ok(Directive::RequireDirectory(require_arg(arg)?)),
        "require_tree" => Ok(Directive::RequireTree(require_arg(arg)?)),
        "depend" | "depend_on" => Ok(Directive::Depend(require_arg(arg)?)),
        "stub" => Ok(Directive::Stub(require_arg(arg)?)),
        "include" => Ok(Directive::Include(require_arg(arg)?)),
        "provide" => Ok(Directive::Provide(require_arg(arg)?)),
        "compat" => Ok(Directive::Compat),
        _ => Err(GraphError::UnknownDirective {
            name: name.to_string(),
            line,
        }),
    }
}

/// Extracts the comment body of a header line, if the line is a comment.
///
/// Recognizes `//` and `#` line comments plus `*` continuation lines and
/// the `/*` opener of block comments.
fn comment_body(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    for marker in ["//", "/*", "*", "#"] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return Some(rest.trim_end_matches("*/"));
        }
    }
    None
}

/// Strips matching surrounding quotes from a directive argument.
fn unquote(arg: &str) -> &str {
    let arg = arg.trim();
    for quote in ['"', '\''] {
        if arg.len() >= 2 && arg.starts_with(quote) && arg.ends_with(quote) {
            return &arg[1..arg.len() - 1];
        }
    }
    arg
}

/// Scans a source file's leading comment block for directives.
///
/// Returns the recognized directives and the source with directive lines
/// removed. Any unknown directive name is an error.
pub fn parse_header(source: &str) -> Result<ParsedSource, GraphError> {
    let mut directives = Vec::new();
    let mut stripped = String::with_capacity(source.len());
    let mut in_header = true;

    for (idx, line) in source.lines().enumerate() {
        if in_header {
            if line.trim().is_empty() {
                stripped.push_str(line);
                stripped.push('\n');
                continue;
            }
            match comment_body(line) {
                Some(body) => {
                    if let Some(directive_text) = body.trim_start().strip_prefix('=') {
                        let mut words = directive_text.trim().splitn(2, char::is_whitespace);
                        let name = words.next().unwrap_or_default();
                        let arg = words
                            .next()
                            .map(unquote)
                            .filter(|a| !a.is_empty())
                            .map(String::from);
                        directives.push((idx + 1, build_directive(name, arg, idx + 1)?));
                        // Directive lines do not reach the output.
                        continue;
                    }
                    stripped.push_str(line);
                    stripped.push('\n');
                }
                None => {
                    in_header = false;
                    stripped.push_str(line);
                    stripped.push('\n');
                }
            }
        } else {
            stripped.push_str(line);
            stripped.push('\n');
        }
    }

    if !source.ends_with('\n') {
        stripped.pop();
    }

    Ok(ParsedSource {
        directives,
        stripped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_comment_require() {
        let parsed = parse_header("//= require ./lib\nconsole.log(1);").unwrap();
        assert_eq!(
            parsed.directives,
            vec![(1, Directive::Require("./lib".to_string()))]
        );
        assert_eq!(parsed.stripped, "console.log(1);");
    }

    #[test]
    fn quoted_argument() {
        let parsed = parse_header("//= require \"./lib\"\nbody();").unwrap();
        assert_eq!(
            parsed.directives,
            vec![(1, Directive::Require("./lib".to_string()))]
        );
    }

    #[test]
    fn hash_comment_style() {
        let parsed = parse_header("#= depend config/version\nbody\n").unwrap();
        assert_eq!(
            parsed.directives,
            vec![(1, Directive::Depend("config/version".to_string()))]
        );
        assert_eq!(parsed.stripped, "body\n");
    }

    #[test]
    fn block_comment_style() {
        let source = "/*\n *= require a\n *= require_tree ./lib\n */\nbody();\n";
        let parsed = parse_header(source).unwrap();
        assert_eq!(
            parsed.directives,
            vec![
                (2, Directive::Require("a".to_string())),
                (3, Directive::RequireTree("./lib".to_string())),
            ]
        );
        assert!(parsed.stripped.contains("body();"));
        assert!(!parsed.stripped.contains("require"));
    }

    #[test]
    fn directives_stop_at_first_code_line() {
        let source = "//= require a\ncode();\n//= require b\n";
        let parsed = parse_header(source).unwrap();
        assert_eq!(parsed.directives.len(), 1);
        assert!(parsed.stripped.contains("//= require b"));
    }

    #[test]
    fn non_directive_comments_are_kept() {
        let source = "// copyright notice\n//= require a\nbody\n";
        let parsed = parse_header(source).unwrap();
        assert_eq!(parsed.directives.len(), 1);
        assert!(parsed.stripped.contains("copyright notice"));
    }

    #[test]
    fn blank_lines_do_not_end_the_header() {
        let source = "//= require a\n\n//= require b\nbody\n";
        let parsed = parse_header(source).unwrap();
        assert_eq!(parsed.directives.len(), 2);
    }

    #[test]
    fn unknown_directive_is_rejected_at_parse_time() {
        let err = parse_header("//= explode now\n").unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnknownDirective { name, line: 1 } if name == "explode"
        ));
    }

    #[test]
    fn missing_argument_is_rejected() {
        let err = parse_header("//= require\n").unwrap_err();
        assert!(matches!(err, GraphError::MissingArgument { line: 1, .. }));
    }

    #[test]
    fn compat_takes_no_argument() {
        let parsed = parse_header("//= compat\n").unwrap();
        assert_eq!(parsed.directives, vec![(1, Directive::Compat)]);
    }

    #[test]
    fn all_directive_names_resolve() {
        let source = "\
//= require a
//= require_directory b
//= require_tree c
//= depend d
//= stub e
//= include f
//= provide g
//= compat
";
        let parsed = parse_header(source).unwrap();
        assert_eq!(parsed.directives.len(), 8);
    }

    #[test]
    fn no_trailing_newline_is_preserved() {
        let parsed = parse_header("body()").unwrap();
        assert_eq!(parsed.stripped, "body()");
        let parsed = parse_header("body()\n").unwrap();
        assert_eq!(parsed.stripped, "body()\n");
    }
}
