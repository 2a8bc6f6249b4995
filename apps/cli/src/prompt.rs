//! Interactive confirmation on stdin.

use std::io::{BufRead, Write};

use vimeops_batch::{Confirm, Direction};

use crate::report::listing_header;

/// Shows the pending keys and waits for Enter.
pub struct PromptConfirm;

impl Confirm for PromptConfirm {
    fn confirm(&self, direction: Direction, pending: &[String]) -> bool {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        match ask(&mut stdin.lock(), &mut stdout, direction, pending) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "confirmation prompt failed");
                false
            }
        }
    }
}

/// Prints the pending list and reads one answer.
///
/// An empty line, `y` or `yes` continues; anything else, or end of input,
/// cancels.
pub fn ask(
    input: &mut impl BufRead,
    output: &mut impl Write,
    direction: Direction,
    pending: &[String],
) -> std::io::Result<bool> {
    writeln!(output, "{}", listing_header(direction))?;
    for key in pending {
        writeln!(output, "{key}")?;
    }
    write!(output, "Press [Enter] to continue or [n] to cancel... ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }
    let answer = line.trim().to_ascii_lowercase();
    Ok(matches!(answer.as_str(), "" | "y" | "yes"))
}
