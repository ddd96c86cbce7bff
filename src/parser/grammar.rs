//! Parser implementation using chumsky

use std::sync::Arc;

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::{self, Delimiters, Token};

/// Top-level item of a fragment
enum Item {
    Node(Spanned<Node>),
    Define(Definition),
}

/// Parse template source into a document
pub fn parse(input: &str, delims: &Delimiters) -> Result<Document, Vec<crate::ParseError>> {
    let len = input.len();

    let tokens = lexer::lex(input, delims).map_err(|e| vec![e])?;
    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    document_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn document_parser<'a, I>() -> impl Parser<'a, I, Document, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let name = select! {
        Token::String(s) => s,
    }
    .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

    let operand = select! {
        Token::Dot => Operand::Dot,
        Token::Field(path) => Operand::Field(path),
        Token::String(s) => Operand::String(s),
        Token::Number(n) => Operand::Number(n),
        Token::Bool(b) => Operand::Bool(b),
    };

    // "name" followed by an optional argument
    let invocation = name
        .clone()
        .then(operand.clone().or_not())
        .map(|(name, operand)| Invocation { name, operand });

    let end_action = just(Token::End).delimited_by(just(Token::Open), just(Token::Close));

    let node = recursive(|node| {
        let text = select! {
            Token::Text(s) => Node::Text(s),
        };

        let print = operand
            .clone()
            .delimited_by(just(Token::Open), just(Token::Close))
            .map(Node::Print);

        let template = just(Token::Template)
            .ignore_then(invocation.clone())
            .delimited_by(just(Token::Open), just(Token::Close))
            .map(Node::Template);

        // {{block "name" .}} default body {{end}}
        let block = just(Token::Block)
            .ignore_then(invocation.clone())
            .delimited_by(just(Token::Open), just(Token::Close))
            .then(node.repeated().collect::<Vec<_>>())
            .then_ignore(end_action.clone())
            .map(|(invocation, nodes)| Node::Block {
                invocation,
                body: Arc::new(Tree::new(nodes)),
            });

        choice((text, template, block, print))
            .map_with(|n, e| Spanned::new(n, span_range(&e.span())))
            .boxed()
    });

    // Definitions are only allowed at the top level
    let define = just(Token::Define)
        .ignore_then(name)
        .delimited_by(just(Token::Open), just(Token::Close))
        .then(node.clone().repeated().collect::<Vec<_>>())
        .then_ignore(end_action)
        .map(|(name, nodes)| {
            Item::Define(Definition {
                name,
                body: Tree::new(nodes),
            })
        });

    choice((define, node.map(Item::Node)))
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|items| {
            let mut doc = Document::default();
            for item in items {
                match item {
                    Item::Node(node) => doc.root.nodes.push(node),
                    Item::Define(def) => doc.definitions.push(def),
                }
            }
            doc
        })
}
