use rustyline::{error::ReadlineError, Editor};
use thiserror::Error;

const HISTORY_FILE: &str = "history.txt";

#[derive(Error, Debug)]
pub enum Error<E> {
    #[error(transparent)]
    Readline(ReadlineError),
    #[error("Eval failed: {0:?}")]
    EvalError(E),
}

/// What the evaluation callback wants the loop to do next.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Continue,
    Quit,
}

pub fn start_repl<E: std::fmt::Debug>(
    prompt: &str,
    mut eval: impl FnMut(String) -> Result<Outcome, E>,
) -> Result<(), Error<E>> {
    let mut editor = Editor::<()>::new();
    editor.load_history(HISTORY_FILE).ok();
    let result = loop {
        match editor.readline(prompt) {
            Ok(line) => {
                editor.add_history_entry(line.as_str());
                match eval(line).map_err(Error::EvalError) {
                    Ok(Outcome::Continue) => {}
                    Ok(Outcome::Quit) => break Ok(()),
                    Err(e) => break Err(e),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("Bye!");
                break Ok(());
            }
            Err(e) => break Err(Error::Readline(e)),
        }
    };
    editor.save_history(HISTORY_FILE).ok();
    result
}
