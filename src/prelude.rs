use chumsky::{error::Simple, Parser};

pub type Span = std::ops::Range<usize>;

pub fn merge_span(lhs: &Span, rhs: &Span) -> Span {
    std::cmp::min(lhs.start, rhs.start)..std::cmp::max(lhs.end, rhs.end)
}

#[derive(derive_more::Deref, Clone, Debug)]
pub struct Spanned<T>(#[deref] pub(crate) T, pub(crate) Span);
impl<T> Spanned<T> {
    pub fn forget(self) -> T {
        self.0
    }
    pub fn value(&self) -> &T {
        &self.0
    }
    pub fn span(&self) -> Span {
        self.1.clone()
    }
}
impl<T> From<Spanned<T>> for (T, Span) {
    fn from(Spanned(value, span): Spanned<T>) -> Self {
        (value, span)
    }
}

pub trait SimpleParser<I: Clone + std::hash::Hash, O>: Parser<I, O, Error = Simple<I>> {}
impl<I: Clone + std::hash::Hash, O, T> SimpleParser<I, O> for T where
    T: Parser<I, O, Error = Simple<I>>
{
}
