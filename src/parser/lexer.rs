//! Lexer for template source
//!
//! Template text alternates between literal text and actions enclosed in
//! delimiters. The delimiter scanner splits the source into those regions and
//! hands each action's interior to a logos lexer.

use logos::Logos;

use crate::error::ParseError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Action delimiters, `{{` and `}}` by default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub left: String,
    pub right: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            left: "{{".to_string(),
            right: "}}".to_string(),
        }
    }
}

impl Delimiters {
    /// Build delimiters, falling back to the defaults for empty values
    pub fn new(left: &str, right: &str) -> Self {
        let default = Self::default();
        Self {
            left: if left.is_empty() { default.left } else { left.to_string() },
            right: if right.is_empty() { default.right } else { right.to_string() },
        }
    }
}

/// Token stream consumed by the grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal text between actions
    Text(String),
    /// Left delimiter opening an action
    Open,
    /// Right delimiter closing an action
    Close,

    // Keywords
    Template,
    Block,
    Define,
    End,

    /// The current data value: `.`
    Dot,
    /// Field chain: `.User.Name`
    Field(Vec<String>),
    String(String),
    Number(f64),
    Bool(bool),
    /// Bare word that is not a keyword
    Ident(String),
    /// Anything the action lexer could not recognise
    Unknown(String),
}

/// Words inside an action
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
enum Word {
    #[token("template")]
    Template,
    #[token("block")]
    Block,
    #[token("define")]
    Define,
    #[token("end")]
    End,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[token(".")]
    Dot,

    #[regex(r"(\.[a-zA-Z_][a-zA-Z0-9_]*)+", |lex| field_path(lex.slice()))]
    Field(Vec<String>),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r"`[^`]*`", |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_string()
    })]
    String(String),

    #[regex(r"-?[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    // Identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),
}

impl From<Word> for Token {
    fn from(word: Word) -> Self {
        match word {
            Word::Template => Token::Template,
            Word::Block => Token::Block,
            Word::Define => Token::Define,
            Word::End => Token::End,
            Word::True => Token::Bool(true),
            Word::False => Token::Bool(false),
            Word::Dot => Token::Dot,
            Word::Field(path) => Token::Field(path),
            Word::String(s) => Token::String(s),
            Word::Number(n) => Token::Number(n),
            Word::Ident(s) => Token::Ident(s),
        }
    }
}

fn field_path(slice: &str) -> Vec<String> {
    slice
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn unescape(slice: &str) -> String {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// `-` followed by whitespace right after the left delimiter
fn has_left_trim(rest: &str) -> bool {
    let mut chars = rest.chars();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace)
}

/// Whitespace followed by `-` right before the right delimiter
fn has_right_trim(inner: &str) -> bool {
    inner
        .strip_suffix('-')
        .is_some_and(|head| head.ends_with(char::is_whitespace))
}

/// Find the start of the right delimiter closing an action, skipping quoted strings
fn find_action_end(input: &str, from: usize, right: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (offset, c) in input[from..].char_indices() {
        let idx = from + offset;
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '`' => quote = Some(c),
            None if input[idx..].starts_with(right) => return Some(idx),
            None => {}
        }
    }
    None
}

/// Lex template source into tokens with spans
pub fn lex(input: &str, delims: &Delimiters) -> Result<Vec<(Token, Span)>, ParseError> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut trim_next = false;

    loop {
        let Some(offset) = input[pos..].find(&delims.left) else {
            push_text(&mut tokens, input, pos..input.len(), trim_next, false);
            break;
        };
        let start = pos + offset;
        let mut inner_start = start + delims.left.len();
        let trim_left = has_left_trim(&input[inner_start..]);
        push_text(&mut tokens, input, pos..start, trim_next, trim_left);
        if trim_left {
            inner_start += 1;
        }

        let interior = &input[inner_start..];
        let comment_start = inner_start + (interior.len() - interior.trim_start().len());
        if input[comment_start..].starts_with("/*") {
            let comment_end = input[comment_start..]
                .find("*/")
                .map(|i| comment_start + i + 2)
                .ok_or(ParseError::UnclosedComment {
                    span: start..input.len(),
                })?;
            let tail = &input[comment_end..];
            let tail_trimmed = tail.trim_start();
            let (trim_right, closing) = match tail_trimmed.strip_prefix('-') {
                Some(rest) if tail.len() != tail_trimmed.len() => (true, rest),
                _ => (false, tail_trimmed),
            };
            if !closing.starts_with(&delims.right) {
                return Err(ParseError::UnclosedAction {
                    span: start..input.len(),
                });
            }
            pos = input.len() - closing.len() + delims.right.len();
            trim_next = trim_right;
            continue;
        }

        let close = find_action_end(input, inner_start, &delims.right).ok_or(
            ParseError::UnclosedAction {
                span: start..input.len(),
            },
        )?;
        let trim_right = has_right_trim(&input[inner_start..close]);
        let inner_end = if trim_right { close - 1 } else { close };

        tokens.push((Token::Open, start..inner_start));
        let mut words = Word::lexer(&input[inner_start..inner_end]);
        while let Some(word) = words.next() {
            let span = words.span();
            let token = match word {
                Ok(word) => word.into(),
                Err(()) => Token::Unknown(words.slice().to_string()),
            };
            tokens.push((token, inner_start + span.start..inner_start + span.end));
        }
        tokens.push((Token::Close, close..close + delims.right.len()));

        pos = close + delims.right.len();
        trim_next = trim_right;
    }

    Ok(tokens)
}

fn push_text(
    tokens: &mut Vec<(Token, Span)>,
    input: &str,
    span: Span,
    trim_start: bool,
    trim_end: bool,
) {
    let mut text = &input[span.clone()];
    if trim_start {
        text = text.trim_start();
    }
    if trim_end {
        text = text.trim_end();
    }
    if !text.is_empty() {
        tokens.push((Token::Text(text.to_string()), span));
    }
}
