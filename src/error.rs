//! Error types for parsing, with ariadne reporting

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::lexer::{TagToken, Token};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };
                report(
                    source,
                    filename,
                    span,
                    message,
                    &format!("{}{}", message, expected_str),
                )
            }
        }
    }
}

/// Render a single-label ariadne report into a string
pub(crate) fn report(
    source: &str,
    filename: &str,
    span: &Span,
    message: &str,
    label: &str,
) -> String {
    let mut buf = Vec::new();
    let written = Report::build(ReportKind::Error, filename, span.start)
        .with_message(message)
        .with_label(
            Label::new((filename, span.clone()))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish()
        .write((filename, Source::from(source)), &mut buf);

    match written {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        // Writing into a Vec only fails on a malformed report; fall back to plain text
        Err(_) => format!("Error: {} ({}:{:?})", message, filename, span),
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        // Closing tags that appear where a different block is open
        let stray_close = match err.found() {
            Some(Token::Tag(
                tok @ (TagToken::EndDefineComponent
                | TagToken::EndUseComponent
                | TagToken::EndDefineSlot
                | TagToken::EndFillSlot
                | TagToken::EndIf
                | TagToken::EndFor
                | TagToken::Else),
            )) => Some(tok.clone()),
            _ => None,
        };

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match stray_close {
                Some(tok) => format!(
                    "Unexpected {} - it does not close the innermost open block",
                    format_token(&Token::Tag(tok))
                ),
                None => {
                    let found_str = match found {
                        Some(tok) => format_token(tok),
                        None => "end of input".to_string(),
                    };
                    format!("Unexpected {}", found_str)
                }
            },
            RichReason::Custom(msg) => msg.to_string(),
        };

        // Format expected tokens nicely
        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Text(_) => "text".to_string(),
        Token::BlockOpen => "'{%'".to_string(),
        Token::BlockClose => "'%}'".to_string(),
        Token::VarOpen => "'{{'".to_string(),
        Token::VarClose => "'}}'".to_string(),
        Token::Invalid(s) => format!("invalid character '{}'", s),
        Token::Tag(tag) => match tag {
            TagToken::Ident(s) => format!("identifier '{}'", s),
            TagToken::String(s) => format!("string \"{}\"", s),
            TagToken::Number(n) => format!("number {}", n),
            TagToken::DefineComponent => "keyword 'definecomponent'".to_string(),
            TagToken::EndDefineComponent => "keyword 'enddefinecomponent'".to_string(),
            TagToken::UseComponent => "keyword 'usecomponent'".to_string(),
            TagToken::EndUseComponent => "keyword 'endusecomponent'".to_string(),
            TagToken::DefineSlot => "keyword 'defineslot'".to_string(),
            TagToken::EndDefineSlot => "keyword 'enddefineslot'".to_string(),
            TagToken::FillSlot => "keyword 'fillslot'".to_string(),
            TagToken::EndFillSlot => "keyword 'endfillslot'".to_string(),
            TagToken::If => "keyword 'if'".to_string(),
            TagToken::Else => "keyword 'else'".to_string(),
            TagToken::EndIf => "keyword 'endif'".to_string(),
            TagToken::For => "keyword 'for'".to_string(),
            TagToken::In => "keyword 'in'".to_string(),
            TagToken::EndFor => "keyword 'endfor'".to_string(),
            TagToken::Not => "keyword 'not'".to_string(),
            TagToken::GenerateId => "keyword 'generate_id'".to_string(),
            TagToken::As => "keyword 'as'".to_string(),
            TagToken::Equals => "'='".to_string(),
            TagToken::Comma => "','".to_string(),
            TagToken::Dot => "'.'".to_string(),
            TagToken::Pipe => "'|'".to_string(),
            TagToken::Colon => "':'".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_format_includes_message_and_filename() {
        let source = "{% usecomponent %}{% endusecomponent %}";
        let errors = parse(source).unwrap_err();
        let formatted = errors[0].format(source, "page.html");
        assert!(formatted.contains("page.html"));
        assert!(formatted.contains("requires at least one argument"));
    }

    #[test]
    fn test_stray_closing_tag_message() {
        let errors = parse("{% if x %}a{% endfor %}").unwrap_err();
        match &errors[0] {
            ParseError::Syntax { message, .. } => {
                assert!(message.contains("'endfor'"), "message was: {}", message);
            }
        }
    }

    #[test]
    fn test_format_token() {
        assert_eq!(format_token(&Token::BlockOpen), "'{%'");
        assert_eq!(
            format_token(&Token::Tag(TagToken::Ident("x".into()))),
            "identifier 'x'"
        );
        assert_eq!(
            format_token(&Token::Tag(TagToken::FillSlot)),
            "keyword 'fillslot'"
        );
    }
}
