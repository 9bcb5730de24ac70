use anyhow::{bail, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Line prompts for the interactive flows
pub struct Prompter {
    editor: DefaultEditor,
}

impl Prompter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }

    /// Ask for a value. An empty answer falls back to `default` when one is given.
    pub fn ask(&mut self, label: &str, default: Option<&str>) -> Result<String> {
        let prompt = match default {
            Some(d) if !d.is_empty() => format!("{} [{}]: ", label.bright_green(), d.bright_black()),
            _ => format!("{}: ", label.bright_green()),
        };

        match self.editor.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    Ok(default.unwrap_or_default().to_string())
                } else {
                    Ok(line.to_string())
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => bail!("Cancelled"),
            Err(err) => Err(err.into()),
        }
    }

    /// Read a line for the chat REPL, starting from `initial`; `None` on Ctrl-D
    pub fn chat_line(&mut self, prompt: &str, initial: &str) -> Result<Option<String>> {
        loop {
            match self.editor.readline_with_initial(prompt, (initial, "")) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        self.editor.add_history_entry(line.as_str())?;
                    }
                    return Ok(Some(line));
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".bright_black());
                    continue;
                }
                Err(ReadlineError::Eof) => return Ok(None),
                Err(err) => return Err(err.into()),
            }
        }
    }
}
