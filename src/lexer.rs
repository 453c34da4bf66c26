use chumsky::prelude::*;

use crate::prelude::{SimpleParser, Spanned};

#[derive(PartialEq, Eq, Hash, Clone, derive_more::Display, Debug)]
pub enum Token {
    #[display(fmt = "(")]
    LParen,
    #[display(fmt = ")")]
    RParen,
    #[display(fmt = ".")]
    Dot,
    #[display(fmt = "->")]
    Arrow,
    #[display(fmt = "=")]
    Equal,
    #[display(fmt = "λ")]
    Lambda,
    #[display(fmt = "let")]
    Let,
    #[display(fmt = "{}", "_0")]
    Ident(String),
}

// Any Unicode letter or digit may appear in an identifier; `λ` is a letter
// but must keep lexing as a binder. Primes are identifier characters so that
// α-converted output (`y'`) parses back.
fn is_ident_char(c: &char) -> bool {
    (c.is_alphanumeric() && *c != 'λ') || *c == '_' || *c == '\''
}

pub fn lexer() -> impl SimpleParser<char, Vec<Spanned<Token>>> {
    let ident = filter(is_ident_char)
        .repeated()
        .at_least(1)
        .collect::<String>()
        .map(|text| match text.as_str() {
            "let" => Token::Let,
            _ => Token::Ident(text),
        });
    let token = choice((
        just("->").to(Token::Arrow),
        just('λ').to(Token::Lambda),
        just('\\').to(Token::Lambda),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('.').to(Token::Dot),
        just('=').to(Token::Equal),
        ident,
    ));
    token
        .map_with_span(Spanned)
        .padded()
        .repeated()
        .then_ignore(end())
}
