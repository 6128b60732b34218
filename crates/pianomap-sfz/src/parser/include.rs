//! Recursive `#include` expansion interleaved with macro discovery.
//!
//! Included files may both use and introduce macros, including macros that
//! appear in the paths of other includes (even earlier ones in the including
//! file). Expansion therefore runs to a fixed point: each pass expands every
//! include whose path is fully resolved, learns the macros the spliced text
//! defines, and substitutes again. Includes whose path still holds a macro
//! reference wait for a later pass, and so do the includes after them, so
//! files are claimed in document order. Only when a pass would otherwise
//! stall are later includes expanded past a waiting one, up to the first
//! that defines a macro, since it may be the one the waiting path needs.

use std::fs;

use crate::parser::context::ParseContext;
use crate::parser::error::Error;
use crate::parser::lexer::{strip_comments, Lexer, Token};
use crate::parser::macros::has_macro_reference;
use crate::parser::path_utils::{absolute_path, resolve_include_path};

/// Upper bound on expand/substitute passes over the root document.
const MAX_EXPANSION_PASSES: usize = 32;

/// What to do with an include whose path still contains a macro reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unresolved {
    /// Leave the directive and every include after it for a later pass
    Defer,
    /// Leave the directive in place and expand later includes up to the
    /// first one that defines a macro
    Skip,
    /// Try the path as written
    Resolve,
}

struct Expansion {
    text: String,
    replaced: usize,
    /// Stopped at an include that has to wait (`Unresolved::Defer` only)
    blocked: bool,
}

/// Flatten a root document: strip comments, expand all includes and
/// substitute all known macros.
///
/// Never fails: missing, unreadable and circular includes become placeholder
/// comments and are recorded in `ctx.diagnostics`.
pub fn preprocess(source: &str, ctx: &mut ParseContext) -> String {
    let mut text = strip_comments(source);
    ctx.macros.discover(&text);
    text = ctx.macros.substitute(&text);
    ctx.velocity_mapping.scan(&text);

    for _ in 0..MAX_EXPANSION_PASSES {
        let before = ctx.macros.clone();
        let mut expansion = expand(&text, ctx, Unresolved::Defer);
        if expansion.replaced == 0 {
            expansion = expand(&text, ctx, Unresolved::Skip);
        }
        ctx.macros.discover(&expansion.text);
        text = ctx.macros.substitute(&expansion.text);
        if expansion.replaced == 0 && ctx.macros == before {
            break;
        }
    }

    let expansion = expand(&text, ctx, Unresolved::Resolve);
    if expansion.replaced == 0 {
        return text;
    }
    ctx.macros.discover(&expansion.text);
    ctx.macros.substitute(&expansion.text)
}

/// Expand every `#include` in `text` once, recursively and left to right.
pub fn expand_includes(text: &str, ctx: &mut ParseContext) -> String {
    expand(text, ctx, Unresolved::Resolve).text
}

fn expand(text: &str, ctx: &mut ParseContext, unresolved: Unresolved) -> Expansion {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut replaced = 0;
    let mut blocked = false;

    for spanned in Lexer::new(text) {
        let Token::Include { path } = spanned.token else {
            continue;
        };
        if unresolved != Unresolved::Resolve && has_macro_reference(path) {
            log::debug!("Deferring include with unresolved macro: {}", path);
            if unresolved == Unresolved::Defer {
                blocked = true;
                break;
            }
            continue;
        }

        let nested = match unresolved {
            Unresolved::Skip => Unresolved::Defer,
            mode => mode,
        };
        let snapshot = (unresolved == Unresolved::Skip).then(|| ctx.macros.clone());
        let included = include_file(path, ctx, nested);
        out.push_str(&text[last..spanned.span.start]);
        out.push_str(&included.text);
        last = spanned.span.end;
        replaced += 1;
        let learned = snapshot.is_some_and(|macros| macros != ctx.macros);
        if included.blocked || learned {
            blocked = true;
            break;
        }
    }

    out.push_str(&text[last..]);
    Expansion {
        text: out,
        replaced,
        blocked,
    }
}

/// Replacement text for one `#include` directive.
///
/// Always ends with a line break so that a spliced `#define` or placeholder
/// comment cannot swallow the rest of the including line.
fn include_file(include: &str, ctx: &mut ParseContext, unresolved: Unresolved) -> Expansion {
    let full_path = resolve_include_path(&ctx.base_dir, include);
    if !full_path.is_file() {
        log::warn!("Include file not found: {}", full_path.display());
        ctx.diagnostics.push(Error::MissingInclude(full_path));
        return placeholder(format!("// Missing include: {}\n", include));
    }

    let abs_path = absolute_path(&full_path);
    if !ctx.visited.insert(abs_path.clone()) {
        log::debug!("Circular include avoided: {}", abs_path.display());
        ctx.diagnostics.push(Error::CircularInclude(abs_path));
        return placeholder(format!("// Circular include avoided: {}\n", include));
    }

    let content = match fs::read_to_string(&full_path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("Failed to read include {}: {}", full_path.display(), e);
            ctx.diagnostics.push(Error::IO(e));
            return placeholder(format!("// Unreadable include: {}\n", include));
        }
    };

    let content = strip_comments(&content);
    ctx.macros.discover(&content);
    let content = ctx.macros.substitute(&content);
    ctx.velocity_mapping.scan(&content);

    let mut expanded = expand(&content, ctx, unresolved);
    if !expanded.text.ends_with('\n') {
        expanded.text.push('\n');
    }
    expanded
}

fn placeholder(text: String) -> Expansion {
    Expansion {
        text,
        replaced: 0,
        blocked: false,
    }
}
