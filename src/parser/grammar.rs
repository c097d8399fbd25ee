//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::ParseError;
use crate::parser::ast::*;
use crate::parser::lexer::{lex, TagToken, Token};
use crate::value::Value;

/// Parse template source into an AST
///
/// Besides grammar errors this rejects misplaced slot tags: `defineslot`
/// outside a component definition and `fillslot` anywhere but directly
/// inside a `usecomponent` block.
pub fn parse(input: &str) -> Result<Document, Vec<ParseError>> {
    let len = input.len();

    let token_iter = lex(input)
        .into_iter()
        .map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    let document = document_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(ParseError::from).collect::<Vec<_>>())?;

    let mut errors = Vec::new();
    check_placement(&document.nodes, Placement::default(), &mut errors);
    if errors.is_empty() {
        Ok(document)
    } else {
        Err(errors)
    }
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

/// A keyword token inside a tag
fn keyword<'a, I>(kw: TagToken) -> impl Parser<'a, I, Token, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    just(Token::Tag(kw))
}

/// `{% <kw> %}`, used for `else` and all closing tags
fn bare_tag<'a, I>(kw: TagToken) -> impl Parser<'a, I, (), extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    just(Token::BlockOpen)
        .ignore_then(keyword(kw))
        .ignore_then(just(Token::BlockClose))
        .ignored()
}

fn identifier<'a, I>(
) -> impl Parser<'a, I, Spanned<Identifier>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    select! {
        Token::Tag(TagToken::Ident(s)) => Identifier::new(s),
    }
    .map_with(|id, e| Spanned::new(id, span_range(&e.span())))
}

/// The name token that every component and slot tag starts with
fn required_name<'a, I>(
    tag: &'static str,
    what: &'static str,
) -> impl Parser<'a, I, Spanned<Identifier>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    identifier().or_not().try_map(move |name, span| {
        name.ok_or_else(|| {
            Rich::custom(
                span,
                format!("'{}' tag requires at least one argument ({})", tag, what),
            )
        })
    })
}

/// Expressions: literals, dotted lookups and filter chains
fn expression<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let literal = select! {
        Token::Tag(TagToken::String(s)) => Value::String(s),
        Token::Tag(TagToken::Number(n)) => Value::Number(n),
    }
    .map(Expr::Literal);

    let segment = select! {
        Token::Tag(TagToken::Ident(s)) => PathSegment::Key(s),
        Token::Tag(TagToken::Number(n)) if n >= 0.0 && n.fract() == 0.0 => PathSegment::Index(n as usize),
    };

    // A bare True/False/None is a literal; anything dotted is a lookup
    let variable = identifier()
        .then(
            just(Token::Tag(TagToken::Dot))
                .ignore_then(segment)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .map(|(head, rest)| match (head.node.as_str(), rest.is_empty()) {
            ("True", true) => Expr::Literal(Value::Bool(true)),
            ("False", true) => Expr::Literal(Value::Bool(false)),
            ("None", true) => Expr::Literal(Value::None),
            _ => {
                let mut path = vec![PathSegment::Key(head.node.0)];
                path.extend(rest);
                Expr::Lookup(path)
            }
        });

    let atom = choice((literal, variable));

    let filter = just(Token::Tag(TagToken::Pipe))
        .ignore_then(identifier())
        .then(
            just(Token::Tag(TagToken::Colon))
                .ignore_then(atom.clone())
                .or_not(),
        );

    atom.then(filter.repeated().collect::<Vec<_>>())
        .map(|(first, filters)| {
            filters
                .into_iter()
                .fold(first, |input, (name, arg)| Expr::Filter {
                    input: Box::new(input),
                    name,
                    arg: arg.map(Box::new),
                })
        })
        .boxed()
}

/// Whitespace-separated `key=expr` arguments
fn kwargs<'a, I>() -> impl Parser<'a, I, Vec<Kwarg>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    identifier()
        .then_ignore(just(Token::Tag(TagToken::Equals)))
        .then(expression().map_with(|expr, e| Spanned::new(expr, span_range(&e.span()))))
        .map(|(key, value)| Kwarg { key, value })
        .repeated()
        .collect::<Vec<_>>()
}

fn document_parser<'a, I>() -> impl Parser<'a, I, Document, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let node = recursive(|node| {
        let body = node.clone().repeated().collect::<Vec<_>>();

        let text = select! {
            Token::Text(s) => Node::Text(s),
        };

        let variable = expression()
            .delimited_by(just(Token::VarOpen), just(Token::VarClose))
            .map(Node::Variable);

        // {% if [not] expr %} ... [{% else %} ...] {% endif %}
        let if_node = just(Token::BlockOpen)
            .ignore_then(keyword(TagToken::If))
            .ignore_then(keyword(TagToken::Not).or_not().map(|not| not.is_some()))
            .then(expression())
            .then_ignore(just(Token::BlockClose))
            .then(body.clone())
            .then(bare_tag(TagToken::Else).ignore_then(body.clone()).or_not())
            .then_ignore(bare_tag(TagToken::EndIf))
            .map(|(((negated, condition), then_branch), else_branch)| {
                Node::If(IfNode {
                    negated,
                    condition,
                    then_branch,
                    else_branch: else_branch.unwrap_or_default(),
                })
            });

        // {% for a[, b] in expr %} ... {% endfor %}
        let for_node = just(Token::BlockOpen)
            .ignore_then(keyword(TagToken::For))
            .ignore_then(
                identifier()
                    .separated_by(just(Token::Tag(TagToken::Comma)))
                    .at_least(1)
                    .at_most(2)
                    .collect::<Vec<_>>(),
            )
            .then_ignore(keyword(TagToken::In))
            .then(expression())
            .then_ignore(just(Token::BlockClose))
            .then(body.clone())
            .then_ignore(bare_tag(TagToken::EndFor))
            .map(|((targets, iterable), body)| {
                Node::For(ForNode {
                    targets,
                    iterable,
                    body,
                })
            });

        // {% generate_id expr [as name] %}
        let generate_id = just(Token::BlockOpen)
            .ignore_then(keyword(TagToken::GenerateId))
            .ignore_then(expression())
            .then(keyword(TagToken::As).ignore_then(identifier()).or_not())
            .then_ignore(just(Token::BlockClose))
            .map(|(prefix, target)| Node::GenerateId(GenerateIdNode { prefix, target }));

        let define = just(Token::BlockOpen)
            .ignore_then(keyword(TagToken::DefineComponent))
            .ignore_then(required_name("definecomponent", "component name"))
            .then(kwargs())
            .then_ignore(just(Token::BlockClose))
            .then(body.clone())
            .then_ignore(bare_tag(TagToken::EndDefineComponent))
            .map(|((name, params), body)| {
                Node::ComponentDefine(ComponentDefine { name, params, body })
            });

        let usage = just(Token::BlockOpen)
            .ignore_then(keyword(TagToken::UseComponent))
            .ignore_then(required_name("usecomponent", "component name"))
            .then(kwargs())
            .then_ignore(just(Token::BlockClose))
            .then(body.clone())
            .then_ignore(bare_tag(TagToken::EndUseComponent))
            .map(|((name, params), body)| Node::ComponentUse(ComponentUse { name, params, body }));

        let slot = just(Token::BlockOpen)
            .ignore_then(keyword(TagToken::DefineSlot))
            .ignore_then(required_name("defineslot", "slot name"))
            .then_ignore(just(Token::BlockClose))
            .then(body.clone())
            .then_ignore(bare_tag(TagToken::EndDefineSlot))
            .map(|(name, body)| Node::SlotDeclare(SlotDeclare { name, body }));

        let fill = just(Token::BlockOpen)
            .ignore_then(keyword(TagToken::FillSlot))
            .ignore_then(required_name("fillslot", "slot name"))
            .then_ignore(just(Token::BlockClose))
            .then(body)
            .then_ignore(bare_tag(TagToken::EndFillSlot))
            .map(|(name, body)| Node::SlotFill(SlotFill { name, body }));

        choice((
            text, variable, if_node, for_node, generate_id, define, usage, slot, fill,
        ))
        .map_with(|n, e| Spanned::new(n, span_range(&e.span())))
        .boxed()
    });

    // Document is a list of nodes
    node.repeated()
        .collect()
        .then_ignore(end())
        .map(|nodes| Document { nodes })
}

/// Where a node sits relative to component tags
#[derive(Debug, Clone, Copy, Default)]
struct Placement {
    in_definition: bool,
    direct_in_use: bool,
}

fn check_placement(nodes: &[Spanned<Node>], placement: Placement, errors: &mut Vec<ParseError>) {
    for node in nodes {
        let mut inner = Placement {
            in_definition: placement.in_definition,
            direct_in_use: false,
        };
        match &node.node {
            Node::SlotDeclare(_) if !placement.in_definition => {
                errors.push(ParseError::Syntax {
                    span: node.span.clone(),
                    message: "'defineslot' is only allowed inside a component definition"
                        .to_string(),
                    expected: vec![],
                });
            }
            Node::SlotFill(_) if !placement.direct_in_use => {
                errors.push(ParseError::Syntax {
                    span: node.span.clone(),
                    message: "'fillslot' must be placed directly inside a usecomponent block"
                        .to_string(),
                    expected: vec![],
                });
            }
            Node::ComponentDefine(_) => inner.in_definition = true,
            Node::ComponentUse(_) => inner.direct_in_use = true,
            _ => {}
        }
        for children in node.node.children() {
            check_placement(children, inner, errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(doc: &Document) -> &Node {
        &doc.nodes[0].node
    }

    fn syntax_message(errors: &[ParseError]) -> String {
        match &errors[0] {
            ParseError::Syntax { message, .. } => message.clone(),
        }
    }

    #[test]
    fn test_parse_text_and_variable() {
        let doc = parse("Hi {{ user.name }}!").expect("Should parse");
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(
            doc.nodes[1].node,
            Node::Variable(Expr::Lookup(vec![
                PathSegment::Key("user".into()),
                PathSegment::Key("name".into()),
            ]))
        );
    }

    #[test]
    fn test_parse_literals() {
        let doc = parse("{{ True }}{{ None }}{{ 'x' }}{{ 4 }}{{ items.0 }}").expect("Should parse");
        let exprs: Vec<_> = doc
            .nodes
            .iter()
            .map(|n| match &n.node {
                Node::Variable(expr) => expr.clone(),
                other => panic!("Expected variable, got {:?}", other),
            })
            .collect();
        assert_eq!(exprs[0], Expr::Literal(Value::Bool(true)));
        assert_eq!(exprs[1], Expr::Literal(Value::None));
        assert_eq!(exprs[2], Expr::Literal(Value::from("x")));
        assert_eq!(exprs[3], Expr::Literal(Value::Number(4.0)));
        assert_eq!(
            exprs[4],
            Expr::Lookup(vec![PathSegment::Key("items".into()), PathSegment::Index(0)])
        );
    }

    #[test]
    fn test_parse_chained_index_lookup() {
        let doc = parse("{{ rows.0.1 }}").expect("Should parse");
        assert_eq!(
            first(&doc),
            &Node::Variable(Expr::Lookup(vec![
                PathSegment::Key("rows".into()),
                PathSegment::Index(0),
                PathSegment::Index(1),
            ]))
        );
    }

    #[test]
    fn test_parse_filter_chain() {
        let doc = parse("{{ name|default:'anon'|upper }}").expect("Should parse");
        match first(&doc) {
            Node::Variable(Expr::Filter { input, name, arg }) => {
                assert_eq!(name.node.as_str(), "upper");
                assert!(arg.is_none());
                match input.as_ref() {
                    Expr::Filter { name, arg, .. } => {
                        assert_eq!(name.node.as_str(), "default");
                        assert_eq!(arg.as_deref(), Some(&Expr::Literal(Value::from("anon"))));
                    }
                    other => panic!("Expected inner filter, got {:?}", other),
                }
            }
            other => panic!("Expected filter, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_definition_with_defaults() {
        let doc = parse(
            "{% definecomponent button flat=False cta=False %}<button>{% defineslot button_content %}Click me!{% enddefineslot %}</button>{% enddefinecomponent %}",
        )
        .expect("Should parse");
        match first(&doc) {
            Node::ComponentDefine(def) => {
                assert_eq!(def.name.node.as_str(), "button");
                let keys: Vec<_> = def.params.iter().map(|p| p.key.node.as_str()).collect();
                assert_eq!(keys, vec!["flat", "cta"]);
                assert_eq!(def.params[0].value.node, Expr::Literal(Value::Bool(false)));
                assert_eq!(def.body.len(), 3);
                assert!(matches!(def.body[1].node, Node::SlotDeclare(_)));
            }
            other => panic!("Expected definition, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_use_with_fill() {
        let doc = parse(
            "{% usecomponent button flat=True %} {% fillslot button_content %}test{% endfillslot %} {% endusecomponent %}",
        )
        .expect("Should parse");
        match first(&doc) {
            Node::ComponentUse(usage) => {
                assert_eq!(usage.name.node.as_str(), "button");
                assert_eq!(usage.params.len(), 1);
                let fills: Vec<_> = usage.fills().map(|f| f.name.node.as_str()).collect();
                assert_eq!(fills, vec!["button_content"]);
            }
            other => panic!("Expected use, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_else_and_for() {
        let doc = parse(
            "{% if not flat %}a{% else %}b{% endif %}{% for k, v in pairs %}{{ k }}{% endfor %}",
        )
        .expect("Should parse");
        match &doc.nodes[0].node {
            Node::If(block) => {
                assert!(block.negated);
                assert_eq!(block.then_branch.len(), 1);
                assert_eq!(block.else_branch.len(), 1);
            }
            other => panic!("Expected if, got {:?}", other),
        }
        match &doc.nodes[1].node {
            Node::For(block) => {
                let targets: Vec<_> = block.targets.iter().map(|t| t.node.as_str()).collect();
                assert_eq!(targets, vec!["k", "v"]);
            }
            other => panic!("Expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_generate_id() {
        let doc = parse("{% generate_id 'field' as fid %}").expect("Should parse");
        match first(&doc) {
            Node::GenerateId(tag) => {
                assert_eq!(tag.prefix, Expr::Literal(Value::from("field")));
                assert_eq!(tag.target.as_ref().map(|t| t.node.as_str()), Some("fid"));
            }
            other => panic!("Expected generate_id, got {:?}", other),
        }
    }

    #[test]
    fn test_node_spans_cover_tags() {
        let source = "ab{% usecomponent x %}{% endusecomponent %}";
        let doc = parse(source).expect("Should parse");
        assert_eq!(doc.nodes[1].span, 2..source.len());
        match &doc.nodes[1].node {
            Node::ComponentUse(usage) => assert_eq!(&source[usage.name.span.clone()], "x"),
            other => panic!("Expected use, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_component_name_is_syntax_error() {
        let errors = parse("{% usecomponent %}{% endusecomponent %}").unwrap_err();
        assert!(syntax_message(&errors)
            .contains("'usecomponent' tag requires at least one argument (component name)"));

        let errors = parse("{% definecomponent %}{% enddefinecomponent %}").unwrap_err();
        assert!(syntax_message(&errors).contains("'definecomponent' tag requires"));
    }

    #[test]
    fn test_missing_slot_name_is_syntax_error() {
        let errors =
            parse("{% definecomponent c %}{% defineslot %}{% enddefineslot %}{% enddefinecomponent %}")
                .unwrap_err();
        assert!(syntax_message(&errors).contains("'defineslot' tag requires"));
    }

    #[test]
    fn test_unclosed_block_is_error() {
        assert!(parse("{% definecomponent c %}body").is_err());
        assert!(parse("{% if x %}a{% endfor %}").is_err());
    }

    #[test]
    fn test_slot_outside_definition_rejected() {
        let errors = parse("{% defineslot loose %}x{% enddefineslot %}").unwrap_err();
        assert!(syntax_message(&errors).contains("only allowed inside a component definition"));
    }

    #[test]
    fn test_fill_outside_use_rejected() {
        let errors = parse("{% fillslot loose %}x{% endfillslot %}").unwrap_err();
        assert!(syntax_message(&errors).contains("directly inside a usecomponent block"));

        let nested = "{% usecomponent c %}{% if x %}{% fillslot a %}x{% endfillslot %}{% endif %}{% endusecomponent %}";
        assert!(parse(nested).is_err());
    }

    #[test]
    fn test_slot_inside_fill_within_definition_is_allowed() {
        let source = "{% definecomponent outer %}\
                      {% usecomponent inner %}{% fillslot a %}{% defineslot b %}d{% enddefineslot %}{% endfillslot %}{% endusecomponent %}\
                      {% enddefinecomponent %}";
        assert!(parse(source).is_ok());
    }
}
