use chumsky::prelude::*;

use crate::{
    ast::Term,
    lexer::{self, Token},
    prelude::{merge_span, SimpleParser, Span, Spanned},
};

fn term_parser() -> impl SimpleParser<Token, Term> {
    recursive(|term: Recursive<_, Term, _>| {
        let ident = select! { Token::Ident(name) => name }
            .map_with_span(Spanned)
            .labelled("identifier");

        let var = ident
            .clone()
            .map(|name| {
                let (name, span) = name.into();
                Term::Var { name, span }
            })
            .labelled("variable");

        let atom = choice((
            var,
            term.clone()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        ));

        // `λx y z. B` and `\x y z -> B` curry into nested single-parameter
        // lambdas, each parameter keeping its own span.
        let lambda = just(Token::Lambda)
            .map_with_span(|_, span: Span| span)
            .then(ident.repeated().at_least(1))
            .then_ignore(just(Token::Dot).or(just(Token::Arrow)))
            .then(term)
            .map(|((head, params), body)| {
                params.into_iter().rev().fold(body, |body, param| {
                    let (param, param_span) = param.into();
                    let span = merge_span(&head, &body.span());
                    Term::Lambda {
                        param,
                        param_span,
                        body: body.into(),
                        span,
                    }
                })
            })
            .labelled("lambda");

        let unary = choice((lambda, atom));
        unary
            .clone()
            .then(unary.repeated())
            .foldl(|fun, arg| {
                let span = merge_span(&fun.span(), &arg.span());
                Term::Apply {
                    fun: fun.into(),
                    arg: arg.into(),
                    span,
                }
            })
            .labelled("term")
    })
}

fn statement_parser() -> impl SimpleParser<Token, Term> {
    let ident = select! { Token::Ident(name) => name }
        .map_with_span(Spanned)
        .labelled("identifier");

    let binding = just(Token::Let)
        .map_with_span(|_, span: Span| span)
        .then(ident)
        .then_ignore(just(Token::Equal))
        .then(term_parser())
        .map(|((head, name), value)| {
            let (name, name_span) = name.into();
            let span = merge_span(&head, &value.span());
            Term::Let {
                name,
                name_span,
                value: value.into(),
                span,
            }
        })
        .labelled("binding");

    choice((binding, term_parser())).then_ignore(end())
}

pub fn parse(input: &str) -> Result<Term, Vec<Simple<String>>> {
    let len = input.chars().count();
    let eoi = len..len + 1;
    let tokens = lexer::lexer().parse(input).map_err(|es| {
        es.into_iter()
            .map(|e| e.map(|c| c.to_string()))
            .collect::<Vec<_>>()
    })?;
    statement_parser()
        .parse(chumsky::Stream::from_iter(
            eoi,
            tokens.into_iter().map(|t| t.into()),
        ))
        .map_err(|es| {
            es.into_iter()
                .map(|e| e.map(|t| t.to_string()))
                .collect::<Vec<_>>()
        })
}
