use std::io::{self, BufRead, Write};

/// What a prompt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// `q` was typed, or input ended.
    Quit,
}

/// Text in, text out. Every prompt in the game goes through
/// [`Console::prompt`], so `q` quits from anywhere.
pub trait Console {
    /// One raw line, `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    fn print(&mut self, text: &str) -> io::Result<()>;

    fn println(&mut self, text: &str) -> io::Result<()> {
        self.print(text)?;
        self.print("\n")
    }

    fn prompt(&mut self, text: &str) -> io::Result<Input> {
        self.print(text)?;
        let Some(line) = self.read_line()? else {
            return Ok(Input::Quit);
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Ok(Input::Quit);
        }
        Ok(Input::Line(line.to_string()))
    }
}

/// Stdin/stdout.
pub struct Terminal {
    stdin: io::Stdin,
    stdout: io::Stdout,
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: io::stdout(),
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for Terminal {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.stdin.lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn print(&mut self, text: &str) -> io::Result<()> {
        let mut out = self.stdout.lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::ScriptedConsole;

    #[test]
    fn q_quits_in_any_case() {
        let mut console = ScriptedConsole::new(["q", " Q ", "quit"]);
        assert_eq!(console.prompt("> ").unwrap(), Input::Quit);
        assert_eq!(console.prompt("> ").unwrap(), Input::Quit);
        assert_eq!(console.prompt("> ").unwrap(), Input::Line("quit".into()));
    }

    #[test]
    fn end_of_input_quits() {
        let mut console = ScriptedConsole::new(Vec::<&str>::new());
        assert_eq!(console.prompt("> ").unwrap(), Input::Quit);
    }

    #[test]
    fn lines_are_trimmed_and_prompt_is_shown() {
        let mut console = ScriptedConsole::new(["  2\r\n"]);
        assert_eq!(console.prompt("Pick: ").unwrap(), Input::Line("2".into()));
        assert_eq!(console.output(), "Pick: ");
    }
}
