//! Interactive stabilization console.
//!
//! ```text
//! > @nand
//! Loaded: nand
//! {a=0, b=0} -> {...}
//! > a
//! {a=1, b=0} -> {y=1}
//! > b
//! {a=1, b=1} -> {y=0}
//! ```
//!
//! Each toggle or re-run prints one line per distinct result. The first line
//! shows the inputs; later lines are aligned under its arrow.

use anyhow::{Result, bail};
use crash_runtime::{Registry, Settle, Simulator, Status, Value};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fmt::Write;
use std::path::Path;

pub const HELP: &str = "\
Circuit console
---------------
@<name>          select a circuit (e.g. @nand)
<input>          toggle an input between 0 and 1 and run
<input>=<value>  set an input and run
<enter>          run again with the current inputs
list             show the available circuits
help, ?          show this message
quit             leave the console";

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select(String),
    Toggle(String),
    Set(String, Value),
    Rerun,
    List,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let command = match line {
            "" => Command::Rerun,
            "list" => Command::List,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => {
                if let Some(name) = line.strip_prefix('@') {
                    Command::Select(name.trim().to_string())
                } else if let Some((input, value)) = line.split_once('=') {
                    let value = value.trim();
                    let value: Value = match value {
                        "true" => 1,
                        "false" => 0,
                        _ => value
                            .parse()
                            .map_err(|_| anyhow::anyhow!("'{}' is not a value", value))?,
                    };
                    Command::Set(input.trim().to_string(), value)
                } else if line.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    Command::Toggle(line.to_string())
                } else {
                    bail!("unrecognized input '{}', type 'help' for usage", line);
                }
            }
        };
        Ok(command)
    }
}

/// What the caller should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Print(String),
    Quit,
}

pub struct Console<'r> {
    registry: &'r Registry,
    sim: Simulator<'r>,
}

impl<'r> Console<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            sim: Simulator::new(registry),
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        let text = match command {
            Command::Quit => return Ok(Outcome::Quit),
            Command::Help => HELP.to_string(),
            Command::List => {
                let mut out = String::from("Available circuits:");
                for name in self.registry.names() {
                    write!(out, "\n  @{}", name)?;
                }
                out
            }
            Command::Select(name) => {
                self.sim.select(&name)?;
                format!(
                    "Loaded: {}\n{} -> {{...}}",
                    name,
                    braces(&self.sim.inputs())
                )
            }
            Command::Toggle(input) => render(&self.sim.toggle(&input)?),
            Command::Set(input, value) => {
                self.sim.set_input(&input, value)?;
                render(&self.sim.tick()?)
            }
            Command::Rerun => {
                if self.sim.selected().is_none() {
                    return Ok(Outcome::Print(String::new()));
                }
                render(&self.sim.tick()?)
            }
        };
        Ok(Outcome::Print(text))
    }

    /// Parse and execute one line. Errors are reported as text so a typo
    /// never ends the session.
    pub fn handle_line(&mut self, line: &str) -> Outcome {
        match Command::parse(line).and_then(|command| self.execute(command)) {
            Ok(outcome) => outcome,
            Err(err) => Outcome::Print(format!("error: {}", err)),
        }
    }

    /// Read lines until end of input, keeping history in `history`.
    pub fn run(&mut self, history: &Path) -> Result<()> {
        let mut editor = DefaultEditor::new()?;
        if editor.load_history(history).is_err() {
            tracing::debug!(path = %history.display(), "no console history yet");
        }
        println!("{}\n", HELP);

        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        editor.add_history_entry(line.as_str())?;
                    }
                    match self.handle_line(&line) {
                        Outcome::Print(text) if text.is_empty() => {}
                        Outcome::Print(text) => println!("{}", text),
                        Outcome::Quit => break,
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        editor.save_history(history)?;
        Ok(())
    }
}

fn braces(pairs: &[(String, Value)]) -> String {
    let inner = pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", inner)
}

/// Rows of one run. Continuation rows are indented to the width of the
/// first row's input column.
pub fn render(settle: &Settle) -> String {
    let mut lines = Vec::with_capacity(settle.rows.len() + 1);
    let mut padding = 0;
    for row in &settle.rows {
        let outputs = braces(&row.outputs);
        match &row.inputs {
            Some(inputs) => {
                let inputs = braces(inputs);
                padding = inputs.len();
                lines.push(format!("{} -> {}", inputs, outputs));
            }
            None => lines.push(format!("{} -> {}", " ".repeat(padding), outputs)),
        }
    }
    if settle.status == Status::Aborted {
        lines.push(format!(
            "did not stabilize after {} iterations",
            settle.iterations
        ));
    }
    lines.join("\n")
}
