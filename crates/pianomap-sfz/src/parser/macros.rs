//! `#define` macro table and `$NAME` substitution.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::parser::lexer::{Lexer, Token};

/// Prefix of macros that mark an explicit velocity-layer scheme (`$VEL`, `$VEL01`, ...).
pub const VELOCITY_PREFIX: &str = "VEL";

/// Macro holding a dynamics label such as `PP`, `MF` or `FF`.
pub const DYNAMICS_MACRO: &str = "DYN";

/// `${NAME}` (group 1) or bare `$NAME` (group 2). `\w+` is greedy, so a bare
/// reference always names the whole identifier and `$VEL` never matches the
/// start of `$VEL01`.
static MACRO_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{(\w+)\}|(\w+))").expect("macro reference pattern is valid")
});

/// Returns true if `text` contains anything that looks like a macro reference.
pub fn has_macro_reference(text: &str) -> bool {
    MACRO_REFERENCE.is_match(text)
}

/// Macro bindings discovered while preprocessing one instrument
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroTable {
    macros: HashMap<String, String>,
    velocity_variables: BTreeSet<String>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite a binding.
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if name.starts_with(VELOCITY_PREFIX) {
            self.velocity_variables.insert(name.clone());
        }
        self.macros.insert(name, value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.macros.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Whether any `VEL*` macro has been defined.
    pub fn has_velocity_variables(&self) -> bool {
        !self.velocity_variables.is_empty()
    }

    pub fn velocity_variables(&self) -> impl Iterator<Item = &str> {
        self.velocity_variables.iter().map(String::as_str)
    }

    /// Record every `#define` in `text`, in document order.
    ///
    /// Returns the number of definitions seen.
    pub fn discover(&mut self, text: &str) -> usize {
        let mut found = 0;
        for spanned in Lexer::new(text) {
            if let Token::Define { name, value } = spanned.token {
                self.define(name, value);
                found += 1;
            }
        }
        found
    }

    /// Value of `name` with every reference in it resolved through the table.
    ///
    /// Returns `None` for unknown names and for macros whose value reaches
    /// back to themselves, such as `#define $LOOP $LOOP!`.
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.resolve_cached(name, &mut HashMap::new())
    }

    /// Replace every reference to a resolvable macro in one pass.
    ///
    /// `#define` directives are left exactly as written; their values are
    /// resolved through the table instead. References to unknown or cyclic
    /// macros stay literal, so substituting the result again changes nothing.
    pub fn substitute(&self, text: &str) -> String {
        if self.macros.is_empty() {
            return text.to_string();
        }

        let defines: Vec<Range<usize>> = Lexer::new(text)
            .filter(|spanned| matches!(spanned.token, Token::Define { .. }))
            .map(|spanned| spanned.span)
            .collect();
        let in_define = |offset: usize| defines.iter().any(|span| span.contains(&offset));

        let mut cache = HashMap::new();
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in MACRO_REFERENCE.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            if in_define(whole.start()) {
                continue;
            }
            let resolved = reference_name(&caps).and_then(|name| self.resolve_cached(name, &mut cache));
            let Some(value) = resolved else { continue };
            out.push_str(&text[last..whole.start()]);
            out.push_str(&value);
            last = whole.end();
        }
        out.push_str(&text[last..]);
        out
    }

    fn resolve_cached<'a>(
        &'a self,
        name: &str,
        cache: &mut HashMap<&'a str, Option<String>>,
    ) -> Option<String> {
        let (name, value) = self.macros.get_key_value(name)?;
        if let Some(resolved) = cache.get(name.as_str()) {
            return resolved.clone();
        }

        let resolved = if self.reaches_itself(name) {
            log::debug!("Macro ${} refers to itself; leaving it unexpanded", name);
            None
        } else {
            let mut out = String::with_capacity(value.len());
            let mut last = 0;
            for caps in MACRO_REFERENCE.captures_iter(value) {
                let Some(whole) = caps.get(0) else { continue };
                let Some(inner) =
                    reference_name(&caps).and_then(|inner| self.resolve_cached(inner, cache))
                else {
                    continue;
                };
                out.push_str(&value[last..whole.start()]);
                out.push_str(&inner);
                last = whole.end();
            }
            out.push_str(&value[last..]);
            Some(out)
        };

        cache.insert(name.as_str(), resolved.clone());
        resolved
    }

    /// Whether following references from the value of `name` leads back to it.
    ///
    /// Recursion in `resolve_cached` only descends into macros for which this
    /// is false, so it always terminates.
    fn reaches_itself(&self, name: &str) -> bool {
        let mut seen = HashSet::new();
        let mut pending = match self.macros.get(name) {
            Some(value) => references(value),
            None => return false,
        };
        while let Some(next) = pending.pop() {
            if next == name {
                return true;
            }
            if !seen.insert(next) {
                continue;
            }
            if let Some(value) = self.macros.get(next) {
                pending.extend(references(value));
            }
        }
        false
    }
}

fn reference_name<'t>(caps: &regex::Captures<'t>) -> Option<&'t str> {
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Names referenced by `text`, in order.
fn references(text: &str) -> Vec<&str> {
    MACRO_REFERENCE
        .captures_iter(text)
        .filter_map(|caps| reference_name(&caps))
        .collect()
}
