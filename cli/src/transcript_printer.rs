use std::collections::HashMap;
use std::io::Write;

use interio_chat::Message;
use interio_chat::MessageId;
use interio_chat::transcript;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Printed {
    Thinking,
    Final,
}

/// Appends transcript snapshots to a line-oriented output.
///
/// Output is append-only, so each placeholder prints its thinking line once and each finalized
/// message prints once. A placeholder that resolves prints again as its final form.
pub struct TranscriptPrinter<W> {
    out: W,
    printed: HashMap<MessageId, Printed>,
}

impl<W: Write> TranscriptPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed: HashMap::new(),
        }
    }

    pub fn print_snapshot(&mut self, messages: &[Message]) -> std::io::Result<()> {
        for cell in transcript::project(messages) {
            let state = if cell.is_thinking() {
                Printed::Thinking
            } else {
                Printed::Final
            };
            if self.printed.get(&cell.id) == Some(&state) {
                continue;
            }
            for line in cell.display_lines() {
                writeln!(self.out, "{line}")?;
            }
            self.printed.insert(cell.id, state);
        }
        self.out.flush()
    }

    /// Out-of-band notice, e.g. an attachment alert.
    pub fn notice(&mut self, text: &str) -> std::io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
