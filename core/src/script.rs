//! Interpreter for `.ash` scripts.
//!
//! A script is a list of console command lines plus two control forms:
//! `wait <ms>` and `loop` ... `end` (repeats until stopped). `#` starts a
//! comment line. `$1`..`$9` are replaced by script arguments and `$0` by the
//! script name.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, bail};

use crate::SharedModule;
use crate::console::Console;

/// File extension of script files.
pub const SCRIPT_EXT: &str = "ash";

const WAIT_SLICE: Duration = Duration::from_millis(10);

#[derive(Clone, Debug, PartialEq)]
enum Stmt {
    Command { line: usize, text: String },
    Wait(u64),
    Loop(Vec<Stmt>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Script {
    pub name: String,
    body: Vec<Stmt>,
}

impl Script {
    pub fn parse(name: &str, text: &str) -> anyhow::Result<Self> {
        let mut stack: Vec<Vec<Stmt>> = vec![Vec::new()];
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut words = trimmed.split_whitespace();
            match words.next() {
                Some("loop") => stack.push(Vec::new()),
                Some("end") => {
                    if stack.len() < 2 {
                        bail!("{}:{}: 'end' without 'loop'", name, line);
                    }
                    let body = stack.pop().unwrap_or_default();
                    if let Some(parent) = stack.last_mut() {
                        parent.push(Stmt::Loop(body));
                    }
                }
                Some("wait") => {
                    let ms = words
                        .next()
                        .and_then(|w| w.parse::<u64>().ok())
                        .with_context(|| format!("{}:{}: 'wait' needs milliseconds", name, line))?;
                    if let Some(block) = stack.last_mut() {
                        block.push(Stmt::Wait(ms));
                    }
                }
                _ => {
                    if let Some(block) = stack.last_mut() {
                        block.push(Stmt::Command {
                            line,
                            text: trimmed.to_string(),
                        });
                    }
                }
            }
        }
        if stack.len() != 1 {
            bail!("{}: unterminated 'loop'", name);
        }
        Ok(Self {
            name: name.to_string(),
            body: stack.pop().unwrap_or_default(),
        })
    }

    /// Loads a script; its name is the file stem.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse(&name, &text)
    }

    /// Runs the script until it ends, a command fails or `stop` is set.
    pub fn run(
        &self,
        console: &Console,
        module: &SharedModule,
        args: &[String],
        stop: &AtomicBool,
    ) -> anyhow::Result<()> {
        log::debug!("Script '{}' started", self.name);
        self.run_block(&self.body, console, module, args, stop)?;
        log::debug!("Script '{}' finished", self.name);
        Ok(())
    }

    fn run_block(
        &self,
        block: &[Stmt],
        console: &Console,
        module: &SharedModule,
        args: &[String],
        stop: &AtomicBool,
    ) -> anyhow::Result<()> {
        for stmt in block {
            if stop.load(Ordering::Relaxed) {
                return Ok(());
            }
            match stmt {
                Stmt::Command { line, text } => {
                    let command = self.substitute(text, args);
                    let result = console.execute(module, &command);
                    if !result.success() {
                        bail!("{}:{}: '{}' failed: {}", self.name, line, command, result.out);
                    }
                }
                Stmt::Wait(ms) => wait(*ms, stop),
                Stmt::Loop(body) => {
                    while !stop.load(Ordering::Relaxed) {
                        self.run_block(body, console, module, args, stop)?;
                        if body.iter().all(|s| !matches!(s, Stmt::Wait(_))) {
                            thread::sleep(WAIT_SLICE);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn substitute(&self, text: &str, args: &[String]) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '$' {
                if let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                    chars.next();
                    if digit == 0 {
                        out.push_str(&self.name);
                    } else if let Some(arg) = args.get(digit as usize - 1) {
                        out.push_str(arg);
                    }
                    continue;
                }
            }
            out.push(c);
        }
        out
    }
}

fn wait(ms: u64, stop: &AtomicBool) {
    let mut left = Duration::from_millis(ms);
    while !left.is_zero() && !stop.load(Ordering::Relaxed) {
        let slice = left.min(WAIT_SLICE);
        thread::sleep(slice);
        left -= slice;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share;
    use crate::types::{Area, Chapter, Character, Module, ObjectId, Position};
    use std::sync::Arc;

    fn shared() -> SharedModule {
        let chapter = Chapter {
            id: "c".into(),
            name: String::new(),
            areas: vec![Area::new("town")],
            start_area: "town".into(),
            start_position: Position::default(),
        };
        let mut module = Module::new("m", chapter);
        module.characters.push(Character::new("player", "0", "Hero"));
        share(module)
    }

    #[test]
    fn parse_rejects_unbalanced_loops() {
        assert!(Script::parse("s", "loop\nwait 10\n").is_err());
        assert!(Script::parse("s", "end\n").is_err());
        assert!(Script::parse("s", "wait soon\n").is_err());
    }

    #[test]
    fn runs_commands_with_arguments() {
        let module = shared();
        let script = Script::parse(
            "intro",
            "# move the hero\nchar-pos $1 $2 7\nwait 1\nchar-say $1 $0\n",
        )
        .unwrap();
        let stop = AtomicBool::new(false);
        script
            .run(
                &Console::new(),
                &module,
                &["player#0".into(), "3".into()],
                &stop,
            )
            .unwrap();
        let m = module.read().unwrap();
        let pc = m.char(&ObjectId::new("player", "0")).unwrap();
        assert_eq!(pc.position, Position::new(3.0, 7.0));
        assert_eq!(pc.chat_log.last().map(|m| m.text.as_str()), Some("intro"));
    }

    #[test]
    fn failing_command_aborts() {
        let module = shared();
        let script = Script::parse("bad", "char-pos nobody#1 0 0\nchar-say player#0 hi\n").unwrap();
        let stop = AtomicBool::new(false);
        assert!(script.run(&Console::new(), &module, &[], &stop).is_err());
        let m = module.read().unwrap();
        assert!(m.char(&ObjectId::new("player", "0")).unwrap().chat_log.is_empty());
    }

    #[test]
    fn loop_ends_when_stopped() {
        let module = shared();
        let script = Script::parse("ticker", "loop\nchar-heal player#0 1\nwait 5\nend\n").unwrap();
        let stop = Arc::new(AtomicBool::new(false));
        let worker = {
            let stop = stop.clone();
            let module = module.clone();
            thread::spawn(move || script.run(&Console::new(), &module, &[], &stop))
        };
        thread::sleep(Duration::from_millis(30));
        stop.store(true, Ordering::Relaxed);
        assert!(worker.join().unwrap().is_ok());
    }
}
