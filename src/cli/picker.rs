//! Interactive product picker.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker provides the "run `sf forecast` and choose a product" UX
//!
//! Choices are the trained products in the model store.

use std::io::{self, BufRead, Write};

use crate::error::AppError;

/// What the user typed, resolved against the choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Product(String),
    Quit,
    Invalid(String),
}

/// Prompt on stdout/stdin until the user picks one of `choices` (or quits).
pub fn prompt_for_product(choices: &[String]) -> Result<String, AppError> {
    let stdin = io::stdin();
    prompt_with(choices, &mut stdin.lock(), &mut io::stdout())
}

/// Prompt loop over arbitrary input/output streams.
pub fn prompt_with<R: BufRead, W: Write>(
    choices: &[String],
    input: &mut R,
    out: &mut W,
) -> Result<String, AppError> {
    if choices.is_empty() {
        return Err(AppError::not_found(
            "No trained models found. Run `sf train` first.",
        ));
    }

    let write_err = |e: io::Error| AppError::io(format!("Failed to write prompt: {e}"));

    writeln!(out, "Found {} trained product(s):", choices.len()).map_err(write_err)?;
    for (idx, name) in choices.iter().enumerate() {
        writeln!(out, "{:>3}) {name}", idx + 1).map_err(write_err)?;
    }

    loop {
        write!(out, "Select a product by number (1-{}) or name (q to quit): ", choices.len())
            .map_err(write_err)?;
        out.flush().map_err(write_err)?;

        let mut line = String::new();
        let bytes = input
            .read_line(&mut line)
            .map_err(|e| AppError::io(format!("Failed to read input: {e}")))?;
        if bytes == 0 {
            return Err(AppError::usage(
                "No input received. Pass the product with `sf forecast -p <name>`.",
            ));
        }

        match resolve_choice(line.trim(), choices) {
            Choice::Product(name) => return Ok(name),
            Choice::Quit => return Err(AppError::usage("Canceled.")),
            Choice::Invalid(msg) => writeln!(out, "{msg}").map_err(write_err)?,
        }
    }
}

/// Accept a 1-based index or a case-insensitive product name.
pub fn resolve_choice(input: &str, choices: &[String]) -> Choice {
    if input.eq_ignore_ascii_case("q") {
        return Choice::Quit;
    }

    if let Ok(n) = input.parse::<usize>() {
        return match n.checked_sub(1).and_then(|i| choices.get(i)) {
            Some(name) => Choice::Product(name.clone()),
            None => Choice::Invalid(format!(
                "Invalid choice: {n}. Enter a number between 1 and {}.",
                choices.len()
            )),
        };
    }

    match choices.iter().find(|c| c.eq_ignore_ascii_case(input)) {
        Some(name) => Choice::Product(name.clone()),
        None => Choice::Invalid(format!("Unknown product: {input}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices() -> Vec<String> {
        vec!["ibuprofen".to_string(), "paracetamol".to_string()]
    }

    #[test]
    fn resolves_numbers_names_and_quit() {
        let c = choices();
        assert_eq!(resolve_choice("2", &c), Choice::Product("paracetamol".to_string()));
        assert_eq!(resolve_choice("IBUPROFEN", &c), Choice::Product("ibuprofen".to_string()));
        assert_eq!(resolve_choice("Q", &c), Choice::Quit);
        assert!(matches!(resolve_choice("0", &c), Choice::Invalid(_)));
        assert!(matches!(resolve_choice("aspirin", &c), Choice::Invalid(_)));
    }

    #[test]
    fn prompt_retries_until_valid() {
        let mut input = "9\nparacetamol\n".as_bytes();
        let mut out = Vec::new();
        let picked = prompt_with(&choices(), &mut input, &mut out).unwrap();
        assert_eq!(picked, "paracetamol");
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  1) ibuprofen"));
        assert!(text.contains("Invalid choice: 9"));
    }

    #[test]
    fn empty_store_and_eof_are_errors() {
        let mut input = "".as_bytes();
        let mut out = Vec::new();
        assert!(matches!(prompt_with(&[], &mut input, &mut out), Err(AppError::NotFound(_))));
        assert!(matches!(prompt_with(&choices(), &mut input, &mut out), Err(AppError::Usage(_))));
    }
}
