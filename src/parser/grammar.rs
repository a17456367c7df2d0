//! Parser implementation using chumsky

use std::collections::HashSet;

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::fragment::{
    ConditionalFragment, DataFragment, FilterBy, FormatDefinition, Fragment, ReferenceFragment,
    ScopeFragment, SeriesFilter, SeriesFragment,
};
use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// Trailing options of a `data` fragment
#[derive(Debug, Clone)]
enum DataOption {
    Legal(String),
    Default(String),
}

/// Trailing options of a `series` fragment
#[derive(Debug, Clone)]
enum SeriesOption {
    Separator(String),
    Unique,
    Filter(SeriesFilter),
    BindAs(String),
}

/// Parse dictionary source into a syntax tree
pub fn parse(input: &str) -> Result<DictionaryFile, Vec<crate::ParseError>> {
    let len = input.len();

    // Create a logos lexer and convert to token stream
    let token_iter = crate::parser::lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    dictionary_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn dictionary_parser<'a, I>(
) -> impl Parser<'a, I, DictionaryFile, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let string = select! {
        Token::String(s) => s,
    }
    .labelled("string");

    // Directive and item names may be quoted, which also lets keywords be used
    let name = select! {
        Token::Ident(s) => s,
        Token::String(s) => s,
    }
    .labelled("name");

    let fragment = recursive(|fragment| {
        let block = fragment
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BraceOpen), just(Token::BraceClose));

        let literal = string.clone().map(Fragment::Literal);

        // data NAME (legal "re" | default "text")*
        let data = just(Token::Data)
            .ignore_then(name.clone())
            .then(
                choice((
                    just(Token::Legal)
                        .ignore_then(string.clone())
                        .map(DataOption::Legal),
                    just(Token::Default)
                        .ignore_then(string.clone())
                        .map(DataOption::Default),
                ))
                .repeated()
                .collect::<Vec<_>>(),
            )
            .map(|(directive, options)| {
                let mut data = DataFragment::new(directive);
                for option in options {
                    data = match option {
                        DataOption::Legal(pattern) => data.with_legal(pattern),
                        DataOption::Default(text) => data.with_default(text),
                    };
                }
                Fragment::SimpleData(data)
            });

        // ref NAME (when KIND)?
        let reference = just(Token::Ref)
            .ignore_then(name.clone())
            .then(just(Token::When).ignore_then(name.clone()).or_not())
            .map(|(format, when)| {
                Fragment::Reference(ReferenceFragment { name: format, when })
            });

        // lookup MAP by KEY
        let lookup = just(Token::Lookup)
            .ignore_then(name.clone())
            .then_ignore(just(Token::By))
            .then(name.clone())
            .map(|(map, key)| Fragment::lookup(map, key));

        let line = just(Token::Line)
            .ignore_then(block.clone())
            .map(Fragment::Line);

        let indent = just(Token::Indent)
            .ignore_then(block.clone())
            .map(Fragment::IndentBlock);

        // scope KIND "name"? (as BINDING)? { ... }
        let scope = just(Token::Scope)
            .ignore_then(name.clone())
            .then(string.clone().or_not())
            .then(just(Token::As).ignore_then(name.clone()).or_not())
            .then(block.clone())
            .map(|(((directive, name_ref), bind_as), fragments)| {
                Fragment::Scope(ScopeFragment {
                    directive,
                    name_ref,
                    bind_as,
                    fragments,
                })
            });

        let filter = just(Token::Filter)
            .ignore_then(name.clone())
            .then(string.clone())
            .try_map(|(by, pattern), span: SimpleSpan| {
                let by = by
                    .parse::<FilterBy>()
                    .map_err(|e| Rich::custom(span, e.to_string()))?;
                Ok(SeriesOption::Filter(SeriesFilter::new(by, pattern)))
            });

        let series_option = choice((
            just(Token::Separator)
                .ignore_then(string.clone())
                .map(SeriesOption::Separator),
            just(Token::Unique).to(SeriesOption::Unique),
            filter,
            just(Token::As)
                .ignore_then(name.clone())
                .map(SeriesOption::BindAs),
        ));

        // series KIND (separator ", " | unique | filter BY "re" | as BINDING)* { ... }
        let series = just(Token::Series)
            .ignore_then(name.clone())
            .then(series_option.repeated().collect::<Vec<_>>())
            .then(block.clone())
            .map(|((directive, options), fragments)| {
                let mut series = SeriesFragment::new(directive, "", fragments);
                for option in options {
                    match option {
                        SeriesOption::Separator(s) => series.separator = s,
                        SeriesOption::Unique => series.unique = true,
                        SeriesOption::Filter(f) => series.filter = f,
                        SeriesOption::BindAs(n) => series.bind_as = Some(n),
                    }
                }
                Fragment::Series(series)
            });

        // if !?PREDICATE { ... }
        let conditional = just(Token::If)
            .ignore_then(just(Token::Bang).or_not())
            .then(name.clone())
            .then(block)
            .map(|((bang, predicate), fragments)| {
                let directive = match bang {
                    Some(_) => format!("!{}", predicate),
                    None => predicate,
                };
                Fragment::Conditional(ConditionalFragment::new(directive, fragments))
            });

        choice((
            literal,
            data,
            reference,
            lookup,
            line,
            indent,
            scope,
            series,
            conditional,
        ))
        .boxed()
    });

    let body = fragment
        .repeated()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::BraceOpen), just(Token::BraceClose));

    let format = just(Token::Format)
        .ignore_then(name.clone())
        .then(body)
        .map(|(name, fragments)| Item::Format(FormatDefinition::new(name, fragments)));

    let entry = string
        .clone()
        .then_ignore(just(Token::FatArrow))
        .then(string.clone());

    let map = just(Token::Map)
        .ignore_then(name)
        .then(just(Token::Default).ignore_then(string).or_not())
        .then(
            entry
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::BraceOpen), just(Token::BraceClose)),
        )
        .try_map(|((name, default), entries), span: SimpleSpan| {
            let mut seen = HashSet::new();
            for (key, _) in &entries {
                if !seen.insert(key.as_str()) {
                    return Err(Rich::custom(
                        span,
                        format!("duplicate key \"{}\" in map '{}'", key, name),
                    ));
                }
            }
            Ok(Item::Map(MapDecl {
                name,
                default,
                entries,
            }))
        });

    choice((format, map))
        .map_with(|item, e| Spanned::new(item, span_range(&e.span())))
        .repeated()
        .collect()
        .then_ignore(end())
        .map(|items| DictionaryFile { items })
}
