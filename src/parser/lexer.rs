//! Lexer for the template language using logos
//!
//! Lexing happens in two layers. [`Markup`] splits raw source into text runs
//! and the bodies of `{% %}`, `{{ }}` and `{# #}` tags; [`TagToken`] lexes the
//! inside of block and variable tags. [`lex`] stitches both layers into one flat
//! [`Token`] stream with spans into the template source.

use logos::{Lexer, Logos};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Outer layer: raw text and tag bodies
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Markup {
    #[token("{%", |lex| tag_body(lex, "%}"))]
    Block(String),

    #[token("{{", |lex| tag_body(lex, "}}"))]
    Variable(String),

    #[token("{#", |lex| tag_body(lex, "#}"))]
    Comment(String),

    #[regex(r"[^{]+")]
    Text,

    // A lone brace that does not open a tag
    #[token("{")]
    Brace,
}

/// Consume everything up to `close`, returning the tag body without delimiters.
/// An opener without a matching closer is a lexer error and falls back to text.
fn tag_body(lex: &mut Lexer<Markup>, close: &str) -> Option<String> {
    let rest = lex.remainder();
    let end = rest.find(close)?;
    let body = rest[..end].to_string();
    lex.bump(end + close.len());
    Some(body)
}

/// Inner layer: tokens inside `{% %}` and `{{ }}`
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum TagToken {
    // Component keywords
    #[token("definecomponent")]
    DefineComponent,
    #[token("enddefinecomponent")]
    EndDefineComponent,
    #[token("usecomponent")]
    UseComponent,
    #[token("endusecomponent")]
    EndUseComponent,
    #[token("defineslot")]
    DefineSlot,
    #[token("enddefineslot")]
    EndDefineSlot,
    #[token("fillslot")]
    FillSlot,
    #[token("endfillslot")]
    EndFillSlot,

    // Control flow keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("endif")]
    EndIf,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("endfor")]
    EndFor,
    #[token("not")]
    Not,

    #[token("generate_id")]
    GenerateId,
    #[token("as")]
    As,

    #[token("=")]
    Equals,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("|")]
    Pipe,
    #[token(":")]
    Colon,

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_string()
    })]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_string()
    })]
    String(String),

    #[regex(r"-?[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),
}

/// Token stream consumed by the grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal text between tags (adjacent runs are merged)
    Text(String),
    /// `{%`
    BlockOpen,
    /// `%}`
    BlockClose,
    /// `{{`
    VarOpen,
    /// `}}`
    VarClose,
    /// A token inside a tag
    Tag(TagToken),
    /// Characters inside a tag that form no valid token
    Invalid(String),
}

/// Lex template source into a flat token stream with spans
pub fn lex(input: &str) -> Vec<(Token, Span)> {
    let mut tokens = Vec::new();
    let mut markup = Markup::lexer(input);

    while let Some(result) = markup.next() {
        let span = markup.span();
        match result {
            Ok(Markup::Block(body)) => {
                tokens.push((Token::BlockOpen, span.start..span.start + 2));
                lex_tag(&body, span.start + 2, &mut tokens);
                tokens.push((Token::BlockClose, span.end - 2..span.end));
            }
            Ok(Markup::Variable(body)) => {
                tokens.push((Token::VarOpen, span.start..span.start + 2));
                lex_tag(&body, span.start + 2, &mut tokens);
                tokens.push((Token::VarClose, span.end - 2..span.end));
            }
            Ok(Markup::Comment(_)) => {}
            Ok(Markup::Text) | Ok(Markup::Brace) | Err(_) => {
                push_text(&mut tokens, markup.slice(), span);
            }
        }
    }

    tokens
}

/// Lex the body of a single tag, shifting spans by `offset`
fn lex_tag(body: &str, offset: usize, tokens: &mut Vec<(Token, Span)>) {
    let mut lexer = TagToken::lexer(body);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let after_dot = matches!(tokens.last(), Some((Token::Tag(TagToken::Dot), _)));
        let token = match result {
            // `a.0.1` is two index segments, not the number 0.1
            Ok(TagToken::Number(_)) if after_dot && lexer.slice().contains('.') => {
                push_index_segments(lexer.slice(), offset + span.start, tokens);
                continue;
            }
            Ok(tok) => Token::Tag(tok),
            Err(_) => Token::Invalid(lexer.slice().to_string()),
        };
        tokens.push((token, offset + span.start..offset + span.end));
    }
}

/// Split a fractional number slice into `Number`, `Dot`, `Number`
fn push_index_segments(slice: &str, start: usize, tokens: &mut Vec<(Token, Span)>) {
    let mut position = start;
    for (i, part) in slice.split('.').enumerate() {
        if i > 0 {
            tokens.push((Token::Tag(TagToken::Dot), position..position + 1));
            position += 1;
        }
        let token = match part.parse::<f64>() {
            Ok(n) => Token::Tag(TagToken::Number(n)),
            Err(_) => Token::Invalid(part.to_string()),
        };
        tokens.push((token, position..position + part.len()));
        position += part.len();
    }
}

fn push_text(tokens: &mut Vec<(Token, Span)>, text: &str, span: Span) {
    if let Some((Token::Text(previous), previous_span)) = tokens.last_mut() {
        if previous_span.end == span.start {
            previous.push_str(text);
            previous_span.end = span.end;
            return;
        }
    }
    tokens.push((Token::Text(text.to_string()), span));
}
