//! Line-oriented surface of the interpreter: comments, `:` directives, file
//! loading, and result printing with α-equivalent back-substitution.

use std::path::{Path, PathBuf};

use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use chumsky::error::{Simple, SimpleReason};
use thiserror::Error;
use util::repl::Outcome;

use crate::{
    ast::Term,
    equiv,
    eval::{self, Context},
    parser,
    prelude::Span,
    printer::{self, Flags},
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file '{0}' does not exist")]
    Missing(PathBuf),
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn print_error(message: impl std::fmt::Display) {
    eprintln!("{} {message}", "error:".fg(Color::Red));
}

fn build_report(e: &Simple<String>) -> Report<Span> {
    let report = Report::build(ReportKind::Error, (), e.span().start);
    match e.reason() {
        SimpleReason::Unexpected => {
            let found = e.found().map(String::as_str).unwrap_or("end of input");
            let expected = e
                .expected()
                .map(|t| t.as_ref().map(String::as_str).unwrap_or("end of input"))
                .collect::<Vec<_>>()
                .join(", ");
            let expected = if expected.is_empty() {
                "something else"
            } else {
                &expected
            };
            report
                .with_message(format!("Unexpected {found}, expected {expected}"))
                .with_label(
                    Label::new(e.span())
                        .with_message(format!("Unexpected {}", found.fg(Color::Red)))
                        .with_color(Color::Red),
                )
        }
        SimpleReason::Unclosed { span, delimiter } => report
            .with_message(format!("Unclosed delimiter {}", delimiter.fg(Color::Yellow)))
            .with_label(
                Label::new(span.clone())
                    .with_message(format!(
                        "Unclosed delimiter {}",
                        delimiter.fg(Color::Yellow)
                    ))
                    .with_color(Color::Yellow),
            ),
        SimpleReason::Custom(msg) => report.with_message(msg).with_label(
            Label::new(e.span())
                .with_message(format!("{}", msg.fg(Color::Red)))
                .with_color(Color::Red),
        ),
    }
    .finish()
}

pub fn report_parse_errors(input: &str, errors: &[Simple<String>]) {
    for e in errors {
        build_report(e).eprint(Source::from(input)).ok();
    }
}

fn print_result(ctx: &Context, term: &Term) {
    if ctx.flags.contains(Flags::NO_PRINT) {
        return;
    }
    let normal = printer::print(term, ctx.flags);
    println!("{normal}");
    if ctx.flags.contains(Flags::VAR_REPLACEMENT) {
        let replaced = printer::print_with(term, ctx.flags, &|sub| {
            ctx.definitions
                .iter()
                .find(|(_, value)| equiv::alpha_equivalent(ctx, sub, value))
                .map(|(name, _)| name.clone())
        });
        if replaced != normal {
            println!("= {replaced}");
        }
    }
    println!();
}

fn toggle(ctx: &mut Context, label: &str, flag: Flags) {
    ctx.flags.toggle(flag);
    let state = if ctx.flags.contains(flag) {
        "enabled".fg(Color::Green)
    } else {
        "disabled".fg(Color::Red)
    };
    println!("*. {label} {state}");
}

fn run_directive(ctx: &mut Context, input: &str) {
    match input {
        ":p" => toggle(ctx, "parenthesis omission", Flags::ABBREV_PARENS),
        ":h" => toggle(ctx, "haskell-style printing", Flags::HASKELL_STYLE),
        ":c" => toggle(ctx, "curried abbreviation", Flags::ABBREV_LAMBDA),
        ":t" => toggle(ctx, "tracing", Flags::TRACE),
        ":ft" => toggle(ctx, "full tracing", Flags::FULL_TRACE),
        ":v" => toggle(ctx, "reverse variable substitution", Flags::VAR_REPLACEMENT),
        _ if input == ":load" || input.starts_with(":load ") => {
            let path = input[":load".len()..].trim();
            if path.is_empty() {
                print_error("expected path for ':load'");
            } else if let Err(e) = load_file(ctx, Path::new(path)) {
                print_error(e);
            }
        }
        _ => print_error(format_args!("unknown command '{input}'")),
    }
}

/// Evaluates one input line: skip blanks and `#` comments, dispatch `:`
/// directives, otherwise parse, reduce and print.
pub fn eval_line(ctx: &mut Context, line: &str) -> Outcome {
    let input = line.trim();
    if input.is_empty() || input.starts_with('#') {
        return Outcome::Continue;
    }
    if input == ":q" {
        return Outcome::Quit;
    }
    if input.starts_with(':') {
        run_directive(ctx, input);
        println!();
        return Outcome::Continue;
    }

    match parser::parse(input) {
        Err(errors) => report_parse_errors(input, &errors),
        Ok(term) => {
            let flags = ctx.flags;
            let result = eval::evaluate(ctx, &term, flags);
            print_result(ctx, &result);
        }
    }
    Outcome::Continue
}

/// Evaluates a file line by line, without printing results. A parse error
/// stops the load; I/O trouble is the caller's to report.
pub fn load_file(ctx: &mut Context, path: &Path) -> Result<(), LoadError> {
    if !path.exists() {
        return Err(LoadError::Missing(path.to_owned()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;

    let total = text.lines().count();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with(':') {
            if line == ":q" {
                break;
            }
            run_directive(ctx, line);
            continue;
        }
        match parser::parse(line) {
            Err(errors) => {
                print_error(format_args!(
                    "parse error in '{}' (line {})",
                    path.display(),
                    index + 1
                ));
                report_parse_errors(line, &errors);
                println!(
                    "*. {} file '{}' not loaded completely ({} line{})",
                    "warning:".fg(Color::Yellow),
                    path.display(),
                    index,
                    if index == 1 { "" } else { "s" }
                );
                return Ok(());
            }
            Ok(term) => {
                let flags = ctx.flags;
                eval::evaluate(ctx, &term, flags);
            }
        }
    }
    println!(
        "*. loaded {} line{} from '{}'",
        total,
        if total == 1 { "" } else { "s" },
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_comments_and_blanks_are_skipped() {
        let mut ctx = Context::default();
        assert_eq!(eval_line(&mut ctx, ""), Outcome::Continue);
        assert_eq!(eval_line(&mut ctx, "   # a comment"), Outcome::Continue);
        assert!(ctx.definitions.is_empty());
    }

    #[test]
    fn test_quit_directive() {
        let mut ctx = Context::default();
        assert_eq!(eval_line(&mut ctx, ":q"), Outcome::Quit);
        assert_eq!(eval_line(&mut ctx, "  :q  "), Outcome::Quit);
    }

    #[test]
    fn test_toggles_flip_flags() {
        let mut ctx = Context::default();
        eval_line(&mut ctx, ":t");
        assert!(ctx.flags.contains(Flags::TRACE));
        eval_line(&mut ctx, ":t");
        assert!(!ctx.flags.contains(Flags::TRACE));
        eval_line(&mut ctx, ":h");
        eval_line(&mut ctx, ":c");
        eval_line(&mut ctx, ":p");
        eval_line(&mut ctx, ":ft");
        eval_line(&mut ctx, ":v");
        for flag in [
            Flags::HASKELL_STYLE,
            Flags::ABBREV_LAMBDA,
            Flags::ABBREV_PARENS,
            Flags::FULL_TRACE,
            Flags::VAR_REPLACEMENT,
        ] {
            assert!(ctx.flags.contains(flag));
        }
    }

    #[test]
    fn test_definitions_via_lines() {
        let mut ctx = Context::default();
        eval_line(&mut ctx, "let I = \\x -> x");
        assert!(ctx.definitions.contains_key("I"));
    }

    #[test]
    fn test_unknown_directive_continues() {
        let mut ctx = Context::default();
        assert_eq!(eval_line(&mut ctx, ":frobnicate"), Outcome::Continue);
    }

    #[test]
    fn test_load_missing_file() {
        let mut ctx = Context::default();
        let error = load_file(&mut ctx, Path::new("no-such-file.lc")).unwrap_err();
        assert!(matches!(error, LoadError::Missing(_)));
    }

    #[test]
    fn test_load_file_defines_and_stops_on_parse_error() {
        let dir = std::env::temp_dir().join("lc-repl-test");
        std::fs::create_dir_all(&dir).unwrap();

        let good = dir.join("good.lc");
        std::fs::write(&good, "# combinators\nlet I = \\x -> x\n\nlet K = \\x y -> x\n").unwrap();
        let mut ctx = Context::default();
        load_file(&mut ctx, &good).unwrap();
        assert_eq!(ctx.definitions.len(), 2);

        let bad = dir.join("bad.lc");
        std::fs::write(&bad, "let I = \\x -> x\nlet broken = (\nlet K = \\x y -> x\n").unwrap();
        let mut ctx = Context::default();
        load_file(&mut ctx, &bad).unwrap();
        // loading stopped at the parse error
        assert_eq!(ctx.definitions.len(), 1);
    }
}
