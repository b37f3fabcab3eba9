// Terminal name prompt

use std::io::{BufRead, Write};

use gridmerge_engine::{NamePrompt, PromptReply};

/// Line-based name prompt. The suggestion behaves like pre-filled text: an
/// empty line keeps it. End of input cancels.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> NamePrompt for LinePrompt<R, W> {
    fn ask(&mut self, title: &str, suggested: &str, error: Option<&str>) -> PromptReply {
        // Prompt text is best-effort; a closed stderr must not block the answer
        if let Some(error) = error {
            let _ = writeln!(self.output, "  {}", error);
        }
        let _ = write!(self.output, "{} [{}]: ", title, suggested);
        let _ = self.output.flush();

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => PromptReply::Cancelled,
            Ok(_) => {
                let line = line.trim_end_matches(['\r', '\n']);
                if line.is_empty() {
                    PromptReply::Submitted(suggested.to_string())
                } else {
                    PromptReply::Submitted(line.to_string())
                }
            }
        }
    }
}
