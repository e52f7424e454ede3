//! The `gui` console tool: lets console lines and scripts drive the HUD.

use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::{Context, bail};
use mural_core::console::Console;
use mural_core::types::Position;

pub const TOOL_NAME: &str = "gui";

const USAGE: &str = "gui exit | pause | resume | camera <x> <y> | restart | msg <text...>";

#[derive(Clone, Debug, PartialEq)]
pub enum GuiCommand {
    Exit,
    Pause,
    Resume,
    /// Centers the camera at a world position.
    Camera(Position),
    /// Reloads the current area view.
    Restart,
    Msg(String),
}

impl GuiCommand {
    /// Parses the arguments following the tool name.
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let Some(name) = args.first() else {
            bail!("usage: {USAGE}");
        };
        let command = match name.as_str() {
            "exit" => GuiCommand::Exit,
            "pause" => GuiCommand::Pause,
            "resume" => GuiCommand::Resume,
            "restart" => GuiCommand::Restart,
            "camera" => {
                let [x, y] = [args.get(1), args.get(2)].map(|a| a.map(String::as_str).unwrap_or(""));
                let x: f64 = x.parse().with_context(|| format!("bad x: '{x}'"))?;
                let y: f64 = y.parse().with_context(|| format!("bad y: '{y}'"))?;
                GuiCommand::Camera(Position::new(x, y))
            }
            "msg" => {
                if args.len() < 2 {
                    bail!("usage: {USAGE}");
                }
                GuiCommand::Msg(args[1..].join(" "))
            }
            other => bail!("unknown gui command: {other}"),
        };
        Ok(command)
    }
}

/// Registers the tool on `console`; parsed commands arrive on the returned
/// receiver.
pub fn register(console: &Console) -> Receiver<GuiCommand> {
    let (tx, rx) = mpsc::channel();
    let tx: Mutex<Sender<GuiCommand>> = Mutex::new(tx);
    console.register_tool(TOOL_NAME, move |args| {
        let command = GuiCommand::parse(args)?;
        let sent = tx
            .lock()
            .map(|tx| tx.send(command.clone()).is_ok())
            .unwrap_or(false);
        if !sent {
            bail!("HUD is gone");
        }
        Ok(format!("{command:?}"))
    });
    rx
}

pub fn unregister(console: &Console) {
    console.unregister_tool(TOOL_NAME);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn commands_parse() {
        assert_eq!(GuiCommand::parse(&args("exit")).unwrap(), GuiCommand::Exit);
        assert_eq!(
            GuiCommand::parse(&args("camera 10 20.5")).unwrap(),
            GuiCommand::Camera(Position::new(10.0, 20.5))
        );
        assert_eq!(
            GuiCommand::parse(&args("msg hello there")).unwrap(),
            GuiCommand::Msg("hello there".into())
        );
        assert!(GuiCommand::parse(&args("camera ten 2")).is_err());
        assert!(GuiCommand::parse(&args("dance")).is_err());
        assert!(GuiCommand::parse(&[]).is_err());
    }

    #[test]
    fn console_lines_reach_the_receiver() {
        let console = Console::new();
        let rx = register(&console);
        let module = mural_core::share(crate::testing::test_module());
        let result = console.execute(&module, "gui restart");
        assert!(result.success());
        assert_eq!(rx.try_recv().unwrap(), GuiCommand::Restart);

        unregister(&console);
        assert!(!console.has_tool(TOOL_NAME));
    }
}
