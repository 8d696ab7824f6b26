use std::io::{BufRead, Write};
use std::path::PathBuf;

use console::style;

use crate::error::{Error, Result};
use crate::extractor::split_urls;
use crate::options::Menu;

pub const DEFAULT_OUTPUT_DIR: &str = "downloads";

/// Interactive questions over any line reader and writer
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> Result<String> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::InputClosed);
        }
        Ok(line.trim().to_string())
    }

    pub fn output_folder(&mut self) -> Result<PathBuf> {
        write!(
            self.output,
            "Enter output folder (press enter for default '{}'): ",
            DEFAULT_OUTPUT_DIR
        )?;
        let answer = self.read_line()?;
        if answer.is_empty() {
            Ok(PathBuf::from(DEFAULT_OUTPUT_DIR))
        } else {
            Ok(PathBuf::from(answer))
        }
    }

    /// Show a numbered menu and ask until a listed key is entered
    pub fn choose<T: Menu>(&mut self) -> Result<T> {
        writeln!(self.output)?;
        writeln!(self.output, "{}", style(T::TITLE).cyan().bold())?;
        for (i, item) in T::ALL.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, item.label())?;
        }

        loop {
            write!(self.output, "Enter choice (1-{}): ", T::ALL.len())?;
            let answer = self.read_line()?;
            match T::from_key(&answer) {
                Some(choice) => return Ok(choice),
                None => writeln!(
                    self.output,
                    "{} '{}' is not one of the listed options, try again.",
                    style("Invalid choice:").red(),
                    answer
                )?,
            }
        }
    }

    /// Ask for a comma separated URL list until at least one URL is valid
    pub fn urls(&mut self) -> Result<Vec<String>> {
        writeln!(self.output)?;
        writeln!(self.output, "{}", style("Enter YouTube URLs:").cyan().bold())?;
        writeln!(self.output, "- A single URL or several separated by commas.")?;
        writeln!(self.output, "- Example: https://youtu.be/abc123, https://youtu.be/xyz789")?;

        loop {
            write!(self.output, "URLs: ")?;
            let answer = self.read_line()?;
            let (valid, rejected) = split_urls(&answer);

            for url in &rejected {
                writeln!(
                    self.output,
                    "{} {}",
                    style("Skipping invalid YouTube URL:").yellow(),
                    url
                )?;
            }

            if !valid.is_empty() {
                return Ok(valid);
            }
            writeln!(self.output, "{}", style("No valid URLs provided, try again.").red())?;
        }
    }
}
