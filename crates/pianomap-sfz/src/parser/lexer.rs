//! Comment stripping and tokenizing of SFZ text.
//!
//! The lexer turns (usually comment-stripped) SFZ text into a stream of typed
//! tokens, each carrying its byte span in the source. Every later stage works
//! on this stream instead of pattern-matching the text again: macro discovery
//! looks for [`Token::Define`], the include resolver splices text over the span
//! of each [`Token::Include`], and the section parser groups
//! [`Token::Opcode`]s under the preceding [`Token::Header`].
//!
//! # Opcode values
//!
//! An opcode value starts right after `=` and runs to the end of the line,
//! except that it stops at the whitespace before the next token start. A token
//! start is `identifier=`, a well-formed `<header>`, `#define`, `#include` or
//! `//`. So values can contain spaces and can contain `=` as long as that `=`
//! does not follow whitespace and an identifier:
//!
//! ```text
//! sample=Samples/A0 v1.flac lokey=21     -> sample = "Samples/A0 v1.flac"
//! region_label=a=b hikey=30              -> region_label = "a=b"
//! region_label=x y=z                     -> region_label = "x", y = "z"
//! ```

use std::ops::Range;

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_till, take_while1},
    character::complete::{char, space1},
    combinator::verify,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

/// Marker that starts a line comment.
pub const COMMENT_MARKER: &str = "//";

/// Remove every `//` comment up to the end of its line.
///
/// Line structure is kept, so spans and line-bounded values (`#define`) are
/// unaffected by the removal.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match line.find(COMMENT_MARKER) {
            Some(pos) => out.push_str(&line[..pos]),
            None => out.push_str(line),
        }
    }
    out
}

/// A single lexical unit of SFZ text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `#define $NAME value` (value is the trimmed rest of the line)
    Define { name: &'a str, value: &'a str },
    /// `#include "path"`
    Include { path: &'a str },
    /// `<name>`
    Header(&'a str),
    /// `key=value`
    Opcode { key: &'a str, value: &'a str },
    /// `// ...` (only placeholders survive comment stripping)
    Comment(&'a str),
    /// Anything else, up to the next whitespace or `<`
    Unknown(&'a str),
}

/// A token together with its byte range in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    pub span: Range<usize>,
}

/// Iterator over the tokens of a piece of SFZ text
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Spanned<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.src[self.pos..].trim_start();
        if rest.is_empty() {
            self.pos = self.src.len();
            return None;
        }

        let start = self.src.len() - rest.len();
        let (remaining, token) = next_token(rest);
        let end = self.src.len() - remaining.len();
        self.pos = end;

        Some(Spanned {
            token,
            span: start..end,
        })
    }
}

/// Lex one token; always consumes at least one character.
fn next_token(input: &str) -> (&str, Token<'_>) {
    match alt((comment, define_directive, include_directive, header, opcode))(input) {
        Ok(parsed) => parsed,
        Err(_) => unknown(input),
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn opcode_key(input: &str) -> IResult<&str, &str> {
    terminated(identifier, char('='))(input)
}

fn comment(input: &str) -> IResult<&str, Token<'_>> {
    let (rest, text) = preceded(tag(COMMENT_MARKER), take_till(|c: char| c == '\n'))(input)?;
    Ok((rest, Token::Comment(text.trim())))
}

fn define_directive(input: &str) -> IResult<&str, Token<'_>> {
    let (rest, name) = preceded(
        pair(tag("#define"), space1),
        preceded(char('$'), identifier),
    )(input)?;
    let (rest, value) = preceded(
        space1,
        verify(take_till(|c: char| c == '\n'), |v: &str| !v.trim().is_empty()),
    )(rest)?;
    Ok((
        rest,
        Token::Define {
            name,
            value: value.trim(),
        },
    ))
}

fn include_directive(input: &str) -> IResult<&str, Token<'_>> {
    let (rest, path) = preceded(
        pair(tag("#include"), space1),
        delimited(char('"'), is_not("\"\n"), char('"')),
    )(input)?;
    Ok((rest, Token::Include { path }))
}

fn header(input: &str) -> IResult<&str, Token<'_>> {
    let (rest, name) = delimited(char('<'), identifier, char('>'))(input)?;
    Ok((rest, Token::Header(name)))
}

fn opcode(input: &str) -> IResult<&str, Token<'_>> {
    let (rest, key) = opcode_key(input)?;
    let len = value_len(rest);
    Ok((
        &rest[len..],
        Token::Opcode {
            key,
            value: rest[..len].trim(),
        },
    ))
}

/// Byte length of the opcode value at the start of `input`.
fn value_len(input: &str) -> usize {
    for (i, c) in input.char_indices() {
        if c == '\n' || c == '\r' {
            return i;
        }
        if c.is_whitespace() && starts_token(input[i..].trim_start_matches([' ', '\t'])) {
            return i;
        }
    }
    input.len()
}

fn starts_token(input: &str) -> bool {
    input.starts_with(COMMENT_MARKER)
        || input.starts_with("#define")
        || input.starts_with("#include")
        || header(input).is_ok()
        || opcode_key(input).is_ok()
}

fn unknown(input: &str) -> (&str, Token<'_>) {
    let end = input
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c.is_whitespace() || c == '<')
        .map_or(input.len(), |(i, _)| i);
    (&input[end..], Token::Unknown(&input[..end]))
}
