//! Background script workers, grouped by the area that started them.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use mural_core::script::{SCRIPT_EXT, Script};

use crate::game::Game;

pub struct ScriptHandle {
    name: String,
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ScriptHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Tells the script to stop and waits for its worker to end.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Script worker '{}' panicked", self.name);
            }
        }
    }
}

/// Starts `script` on its own worker. Failures are logged and end the
/// worker.
pub fn run_script(game: &Arc<Game>, script: Script, args: Vec<String>) -> Result<ScriptHandle, String> {
    let stop = Arc::new(AtomicBool::new(false));
    let name = script.name.clone();
    let worker_stop = Arc::clone(&stop);
    let game = Arc::clone(game);
    let thread = thread::Builder::new()
        .name(format!("script-{name}"))
        .spawn(move || {
            if let Err(err) = script.run(game.console(), game.module(), &args, &worker_stop) {
                log::error!("Script '{}' failed: {:#}", script.name, err);
            }
        })
        .map_err(|e| format!("Failed to start script {name}: {e}"))?;
    Ok(ScriptHandle {
        name,
        stop,
        thread: Some(thread),
    })
}

fn script_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == SCRIPT_EXT))
        .collect();
    files.sort();
    files
}

pub struct ScriptHost {
    game: Arc<Game>,
    scripts_dir: PathBuf,
    area: Vec<ScriptHandle>,
    detached: Vec<ScriptHandle>,
}

impl ScriptHost {
    pub fn new(game: Arc<Game>, scripts_dir: PathBuf) -> Self {
        Self {
            game,
            scripts_dir,
            area: Vec::new(),
            detached: Vec::new(),
        }
    }

    /// Runs `<scripts dir>/<name>.ash` in the background.
    pub fn run_named(&mut self, name: &str, args: Vec<String>) -> Result<(), String> {
        let path = self.scripts_dir.join(format!("{name}.{SCRIPT_EXT}"));
        let script = Script::load(&path).map_err(|e| format!("{e:#}"))?;
        let handle = run_script(&self.game, script, args)?;
        self.detached.retain(|h| !h.finished());
        self.detached.push(handle);
        Ok(())
    }

    /// Stops every script of the previous area, then starts each script
    /// found in `dir`.
    pub fn change_area(&mut self, dir: &Path) {
        for handle in &mut self.area {
            handle.stop();
        }
        self.area.clear();

        for path in script_files(dir) {
            let script = match Script::load(&path) {
                Ok(script) => script,
                Err(err) => {
                    log::error!("{err:#}");
                    continue;
                }
            };
            match run_script(&self.game, script, Vec::new()) {
                Ok(handle) => {
                    log::info!("Area script '{}' started", handle.name());
                    self.area.push(handle);
                }
                Err(err) => log::error!("{err}"),
            }
        }
    }

    pub fn area_scripts(&self) -> impl Iterator<Item = &str> {
        self.area.iter().map(|h| h.name())
    }

    pub fn stop_all(&mut self) {
        for handle in self.area.iter_mut().chain(self.detached.iter_mut()) {
            handle.stop();
        }
        self.area.clear();
        self.detached.clear();
    }
}

impl Drop for ScriptHost {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_module;
    use mural_core::console::Console;
    use std::sync::Mutex;
    use std::time::Duration;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mural-scripts-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn old_area_scripts_stop_before_new_ones_start() {
        let marks = Arc::new(Mutex::new(Vec::<String>::new()));
        let console = Console::new();
        {
            let marks = Arc::clone(&marks);
            console.register_tool("mark", move |args| {
                marks.lock().unwrap().push(args.join(" "));
                Ok(String::new())
            });
        }
        let game = Arc::new(Game::new(mural_core::share(test_module()), console));

        let village = temp_dir("village");
        fs::write(village.join("ticker.ash"), "loop\nmark old\nwait 2\nend\n").unwrap();
        let forest = temp_dir("forest");
        fs::write(forest.join("intro.ash"), "mark new\n").unwrap();
        fs::write(forest.join("notes.txt"), "not a script").unwrap();

        let mut host = ScriptHost::new(Arc::clone(&game), temp_dir("named"));
        host.change_area(&village);
        assert_eq!(host.area_scripts().collect::<Vec<_>>(), vec!["ticker"]);
        thread::sleep(Duration::from_millis(20));

        host.change_area(&forest);
        assert_eq!(host.area_scripts().collect::<Vec<_>>(), vec!["intro"]);
        while host.area.iter().any(|h| !h.finished()) {
            thread::sleep(Duration::from_millis(1));
        }
        host.stop_all();

        let marks = marks.lock().unwrap();
        let first_new = marks.iter().position(|m| m == "new").unwrap();
        assert!(marks[..first_new].iter().all(|m| m == "old"));
        assert!(marks[first_new + 1..].is_empty());
    }

    #[test]
    fn missing_named_script_is_an_error() {
        let game = Arc::new(Game::new(mural_core::share(test_module()), Console::new()));
        let mut host = ScriptHost::new(game, temp_dir("missing"));
        assert!(host.run_named("nothing", Vec::new()).is_err());
    }
}
