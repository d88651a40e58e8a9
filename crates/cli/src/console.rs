//! Line-oriented terminal input.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::error::CliError;

pub struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `label` and read one line. `None` at end of input.
    pub async fn prompt(&mut self, label: &str) -> Result<Option<String>, CliError> {
        {
            let mut stdout = std::io::stdout().lock();
            write!(stdout, "{label}")?;
            stdout.flush()?;
        }

        Ok(self.lines.next_line().await?)
    }

    /// Like [`Console::prompt`], but end of input is an error.
    pub async fn require(&mut self, label: &str) -> Result<String, CliError> {
        self.prompt(label)
            .await?
            .ok_or_else(|| CliError::Usage("Input ended unexpectedly".to_string()))
    }
}
