use std::{convert::Infallible, path::PathBuf};

use anyhow::{Context as _, Result};
use clap::Parser;

use crate::printer::Flags;

mod analysis;
mod ast;
mod equiv;
mod eval;
mod lexer;
mod parser;
mod prelude;
mod printer;
mod repl;

#[derive(Parser)]
#[command(name = "lc", version, about = "An interactive untyped lambda calculus interpreter")]
struct Cli {
    /// Source files evaluated before the prompt appears.
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut ctx = eval::Context::default();
    for path in &cli.files {
        repl::load_file(&mut ctx, path)
            .with_context(|| format!("failed to load '{}'", path.display()))?;
    }

    // interactively, trace and try to back-substitute definitions by default
    ctx.flags.insert(Flags::TRACE | Flags::VAR_REPLACEMENT);

    util::repl::start_repl("λ> ", |line| {
        Ok::<_, Infallible>(repl::eval_line(&mut ctx, &line))
    })?;
    Ok(())
}
