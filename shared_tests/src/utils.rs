//! Utilities for running parsers and reading back what they produced.

use std::env;

use pcomb_core::*;


/// The owned form of a parse result: the end position and the output's value,
/// or the failure.
pub type Outcome = Result<(usize, Value), Failure>;

/// Convert `result`, reading its output through the `sweeper` that produced
/// it.
///
/// # Panics
///
/// If the output cannot be read, since that is a bug in whatever produced it.
pub fn outcome(result: ParseResult<'_>, sweeper: &dyn Sweeper) -> Outcome {
    result.map(|success| {
        let value = success.output.to_value(sweeper)
                                  .unwrap_or_else(|e| panic!("unreadable output: {}", e));
        (success.end, value)
    })
}

/// Run `parser` against `input` and convert the result.
pub fn run(parser: &Parser, input: &str, sweeper: &mut dyn Sweeper) -> Outcome {
    let result = parse(parser, input, sweeper);
    outcome(result, sweeper)
}

/// An expected success.
pub fn ok(end: usize, value: Value) -> Outcome {
    Ok((end, value))
}

/// An expected mismatch.
pub fn mismatch(pos: usize) -> Outcome {
    Err(Failure::unexpected(pos))
}

/// This allows passing a `repeat=$N` command-line argument to the tests that
/// scale with it.
///
/// # Panics
///
/// If the argument is not a number.
pub fn get_arg_repeat() -> usize {
    const DEFAULT: usize = 1 << 16;
    env::args().find_map(
        |arg|
        match *arg.splitn(2, '=').collect::<Vec<_>>() {
            ["repeat", n] => Some(n.parse().unwrap_or_else(|e| panic!("bad repeat: {}", e))),
            _ => None
        }
    ).unwrap_or(DEFAULT)
}
