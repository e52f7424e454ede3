//! Line-oriented console commands against a shared module.
//!
//! Lines are split into whitespace separated arguments (double quotes group
//! words). The first argument names either a built-in command or a tool
//! registered by a front-end, e.g. the HUD's `gui` tool.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use anyhow::{Context, anyhow, bail};

use crate::SharedModule;
use crate::types::{Module, ObjectId, Position, UseAction, UseTarget};

/// Exit code and output of one command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandResult {
    pub code: i32,
    pub out: String,
}

impl CommandResult {
    pub fn ok(out: impl Into<String>) -> Self {
        Self {
            code: 0,
            out: out.into(),
        }
    }

    pub fn failed(out: impl Into<String>) -> Self {
        Self {
            code: 1,
            out: out.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// External command handler; receives the arguments after the tool name.
pub type Tool = dyn Fn(&[String]) -> anyhow::Result<String> + Send + Sync;

const BUILTINS: &[(&str, &str)] = &[
    ("help", "list commands"),
    ("echo", "echo <text...>"),
    ("module-show", "print module summary"),
    ("module-time", "module-time [hour]"),
    ("area-list", "list chapter areas"),
    ("area-chars", "area-chars <area>"),
    ("char-show", "char-show <id#serial>"),
    ("char-move", "char-move <id#serial> <x> <y>"),
    ("char-pos", "char-pos <id#serial> <x> <y>"),
    ("char-area", "char-area <id#serial> <area> [x y]"),
    ("char-heal", "char-heal <id#serial> <amount>"),
    ("char-flag", "char-flag <id#serial> <flag>"),
    ("char-unflag", "char-unflag <id#serial> <flag>"),
    ("char-spawn", "char-spawn <template> <area> <x> <y>"),
    ("char-target", "char-target <id#serial> <target id#serial>"),
    ("char-use", "char-use <id#serial> <skill> [target id#serial]"),
    ("char-say", "char-say <id#serial> <text...>"),
];

#[derive(Clone, Default)]
pub struct Console {
    tools: Arc<RwLock<BTreeMap<String, Arc<Tool>>>>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_tool(
        &self,
        name: &str,
        tool: impl Fn(&[String]) -> anyhow::Result<String> + Send + Sync + 'static,
    ) {
        if let Ok(mut tools) = self.tools.write() {
            tools.insert(name.to_string(), Arc::new(tool));
        }
    }

    pub fn unregister_tool(&self, name: &str) {
        if let Ok(mut tools) = self.tools.write() {
            tools.remove(name);
        }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.read().is_ok_and(|t| t.contains_key(name))
    }

    fn tool(&self, name: &str) -> Option<Arc<Tool>> {
        self.tools.read().ok()?.get(name).cloned()
    }

    /// Executes one command line. Errors become a non-zero exit code.
    pub fn execute(&self, module: &SharedModule, line: &str) -> CommandResult {
        let args = split_args(line);
        let Some(name) = args.first() else {
            return CommandResult::ok("");
        };

        let result = match self.tool(name) {
            Some(tool) => tool(&args[1..]),
            None => self.builtin(module, &args),
        };
        match result {
            Ok(out) => CommandResult::ok(out),
            Err(err) => {
                log::debug!("Command '{}' failed: {:#}", line, err);
                CommandResult::failed(format!("{:#}", err))
            }
        }
    }

    fn builtin(&self, module: &SharedModule, args: &[String]) -> anyhow::Result<String> {
        let name = args[0].as_str();
        if name == "help" {
            let mut out: Vec<String> = BUILTINS.iter().map(|(_, usage)| usage.to_string()).collect();
            if let Ok(tools) = self.tools.read() {
                out.extend(tools.keys().map(|t| format!("{t} ...")));
            }
            return Ok(out.join("\n"));
        }
        if name == "echo" {
            return Ok(args[1..].join(" "));
        }
        if !BUILTINS.iter().any(|(n, _)| *n == name) {
            bail!("unknown command: {}", name);
        }

        let mut module = module
            .write()
            .map_err(|_| anyhow!("module lock poisoned"))?;
        run_builtin(&mut module, name, &args[1..])
    }
}

fn run_builtin(module: &mut Module, name: &str, args: &[String]) -> anyhow::Result<String> {
    match name {
        "module-show" => Ok(format!(
            "{} chapter:{} hour:{} characters:{}",
            module.id,
            module.chapter.id,
            module.hour(),
            module.characters.len()
        )),
        "module-time" => {
            if let Some(hour) = args.first() {
                let hour: u32 = hour.parse().context("invalid hour")?;
                module.set_hour(hour);
            }
            Ok(module.hour().to_string())
        }
        "area-list" => Ok(module
            .chapter
            .areas
            .iter()
            .map(|a| a.id.clone())
            .collect::<Vec<_>>()
            .join("\n")),
        "area-chars" => {
            let area = arg(args, 0)?;
            Ok(module
                .area_chars(area)
                .map(|c| format!("{}#{}", c.id, c.serial))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        "char-show" => {
            let c = module.char(&char_arg(args, 0)?).ok_or_else(|| anyhow!("character not found"))?;
            Ok(format!(
                "{} {}#{} area:{} pos:{:.0}x{:.0} hp:{}/{} mana:{}/{}",
                c.display_name(),
                c.id,
                c.serial,
                c.area,
                c.position.x,
                c.position.y,
                c.health,
                c.max_health,
                c.mana,
                c.max_mana
            ))
        }
        "char-move" => {
            let pos = pos_arg(args, 1)?;
            char_mut(module, args)?.set_dest_point(pos);
            Ok(String::new())
        }
        "char-pos" => {
            let pos = pos_arg(args, 1)?;
            char_mut(module, args)?.set_position(pos);
            Ok(String::new())
        }
        "char-area" => {
            let area = arg(args, 1)?.to_string();
            if module.area(&area).is_none() {
                bail!("unknown area: {}", area);
            }
            let pos = if args.len() > 3 { Some(pos_arg(args, 2)?) } else { None };
            let c = char_mut(module, args)?;
            c.area = area;
            if let Some(pos) = pos {
                c.set_position(pos);
            }
            Ok(String::new())
        }
        "char-heal" => {
            let amount: i32 = arg(args, 1)?.parse().context("invalid amount")?;
            let c = char_mut(module, args)?;
            if amount >= 0 {
                c.heal(amount);
            } else {
                c.damage(-amount);
            }
            Ok(c.health.to_string())
        }
        "char-flag" => {
            let flag = arg(args, 1)?.to_string();
            char_mut(module, args)?.flags.insert(flag);
            Ok(String::new())
        }
        "char-unflag" => {
            let flag = arg(args, 1)?;
            char_mut(module, args)?.flags.remove(flag);
            Ok(String::new())
        }
        "char-spawn" => {
            let template = arg(args, 0)?;
            let area = arg(args, 1)?;
            let pos = pos_arg(args, 2)?;
            let oid = module.spawn_char(template, area, pos)?;
            Ok(oid.to_string())
        }
        "char-target" => {
            let target = char_arg(args, 1)?;
            if module.char(&target).is_none() {
                bail!("target not found: {}", target);
            }
            module.set_targets(&char_arg(args, 0)?, vec![target])?;
            Ok(String::new())
        }
        "char-use" => {
            let user = char_arg(args, 0)?;
            let skill = arg(args, 1)?.to_string();
            let target = match args.get(2) {
                Some(_) => UseTarget::Char(char_arg(args, 2)?),
                None => UseTarget::Auto,
            };
            let outcome = module
                .use_action(&user, UseAction::Skill(skill), target)
                .map_err(|e| anyhow!("{}", e))?;
            Ok(format!("{:?}", outcome).to_lowercase())
        }
        "char-say" => {
            let oid = char_arg(args, 0)?;
            module.chat(&oid, &args[1..].join(" "))?;
            Ok(String::new())
        }
        other => bail!("unknown command: {}", other),
    }
}

fn arg(args: &[String], idx: usize) -> anyhow::Result<&str> {
    args.get(idx)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument {}", idx + 1))
}

fn char_arg(args: &[String], idx: usize) -> anyhow::Result<ObjectId> {
    let text = arg(args, idx)?;
    ObjectId::parse(text).ok_or_else(|| anyhow!("invalid object id: {}", text))
}

fn pos_arg(args: &[String], idx: usize) -> anyhow::Result<Position> {
    let x: f64 = arg(args, idx)?.parse().context("invalid x")?;
    let y: f64 = arg(args, idx + 1)?.parse().context("invalid y")?;
    Ok(Position::new(x, y))
}

fn char_mut<'a>(
    module: &'a mut Module,
    args: &[String],
) -> anyhow::Result<&'a mut crate::types::Character> {
    let oid = char_arg(args, 0)?;
    module
        .char_mut(&oid)
        .ok_or_else(|| anyhow!("character not found: {}", oid))
}

/// Splits a command line on whitespace; double quotes group words.
pub fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut has_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                has_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        args.push(current);
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share;
    use crate::types::{Area, Chapter, Character};
    use std::sync::Mutex;

    fn shared() -> SharedModule {
        let chapter = Chapter {
            id: "c".into(),
            name: String::new(),
            areas: vec![Area::new("town"), Area::new("cave")],
            start_area: "town".into(),
            start_position: Position::default(),
        };
        let mut module = Module::new("m", chapter);
        let mut pc = Character::new("player", "0", "Hero");
        pc.area = "town".into();
        module.characters.push(pc);
        share(module)
    }

    #[test]
    fn split_args_handles_quotes() {
        assert_eq!(
            split_args(r#"char-say player#0 "hello there"  x"#),
            vec!["char-say", "player#0", "hello there", "x"]
        );
        assert_eq!(split_args(r#"echo """#), vec!["echo", ""]);
        assert!(split_args("   ").is_empty());
    }

    #[test]
    fn char_pos_teleports() {
        let module = shared();
        let console = Console::new();
        let res = console.execute(&module, "char-pos player#0 10 20");
        assert!(res.success(), "{}", res.out);
        let m = module.read().unwrap();
        let pc = m.char(&ObjectId::new("player", "0")).unwrap();
        assert_eq!(pc.position, Position::new(10.0, 20.0));
    }

    #[test]
    fn char_area_moves_between_areas() {
        let module = shared();
        let console = Console::new();
        assert!(console.execute(&module, "char-area player#0 cave 5 5").success());
        assert!(!console.execute(&module, "char-area player#0 nowhere").success());
        let m = module.read().unwrap();
        assert_eq!(m.char(&ObjectId::new("player", "0")).unwrap().area, "cave");
    }

    #[test]
    fn unknown_command_fails() {
        let module = shared();
        let res = Console::new().execute(&module, "fly away");
        assert_eq!(res.code, 1);
        assert!(res.out.contains("unknown command"));
    }

    #[test]
    fn registered_tool_receives_arguments() {
        let module = shared();
        let console = Console::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        console.register_tool("gui", move |args| {
            sink.lock().unwrap().extend(args.iter().cloned());
            Ok("done".into())
        });
        let res = console.execute(&module, "gui camera 1 2");
        assert_eq!(res, CommandResult::ok("done"));
        assert_eq!(*seen.lock().unwrap(), vec!["camera", "1", "2"]);

        console.unregister_tool("gui");
        assert!(!console.has_tool("gui"));
    }
}
