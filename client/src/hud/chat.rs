//! Chat box: merged message feed of every visible character plus the
//! input line, which also runs console commands and scripts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{DateTime, Utc};
use mural_core::console::split_args;
use mural_core::types::{LogChannel, Module, ObjectId};
use sdl2::keyboard::Keycode;
use sdl2::rect::Rect;
use sdl2::pixels::Color;

use crate::font_cache::{self, TEXT_COLOR, TEXT_DIM, TEXT_WARN};
use crate::game::{Game, Sight, TICK_INTERVAL};
use crate::i18n::I18n;
use crate::render::{self, PANEL_BG, PANEL_BORDER, RenderContext};

use super::panel::{DrawCtx, FrameCtx, HudAction};

const BOX_W: u32 = 560;
const BOX_H: u32 = 220;
/// Lines kept in the feed; older ones are dropped.
const MAX_LINES: usize = 500;
const PROMPT: &str = "> ";

const COMBAT_COLOR: Color = Color::RGB(220, 150, 110);
const PRIVATE_COLOR: Color = Color::RGB(150, 200, 230);

/// Where a chat line came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Chat,
    Combat,
    Private,
    /// Module-wide log and console output.
    System,
}

impl From<LogChannel> for LineKind {
    fn from(channel: LogChannel) -> Self {
        match channel {
            LogChannel::Chat => LineKind::Chat,
            LogChannel::Combat => LineKind::Combat,
            LogChannel::Private => LineKind::Private,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatLine {
    pub time: DateTime<Utc>,
    pub kind: LineKind,
    pub speaker: Option<String>,
    pub text: String,
    /// `text` is a translation id.
    pub translated: bool,
}

impl ChatLine {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            kind: LineKind::System,
            speaker: None,
            text: text.into(),
            translated: false,
        }
    }

    pub fn render(&self, i18n: &I18n) -> String {
        let text = if self.translated {
            i18n.text(&self.text)
        } else {
            self.text.as_str()
        };
        match &self.speaker {
            Some(speaker) => format!("{speaker}: {text}"),
            None => text.to_string(),
        }
    }
}

/// What a submitted input line asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatInput {
    /// `$command` run by the local console.
    Console(String),
    /// `$command` forwarded to the attached server.
    ServerCommand(String),
    /// `%name args...`
    Script { name: String, args: Vec<String> },
    Say(String),
    Empty,
}

/// Parses an input line. Commands go to the server when one is attached,
/// except `gui` commands, which always drive the local HUD.
pub fn parse_input(line: &str, has_server: bool) -> ChatInput {
    let line = line.trim();
    if let Some(command) = line.strip_prefix('$') {
        let command = command.trim();
        if command.is_empty() {
            return ChatInput::Empty;
        }
        return if has_server && !command.starts_with(super::gui_tool::TOOL_NAME) {
            ChatInput::ServerCommand(command.to_string())
        } else {
            ChatInput::Console(command.to_string())
        };
    }
    if let Some(script) = line.strip_prefix('%') {
        let mut args = split_args(script);
        if args.is_empty() {
            return ChatInput::Empty;
        }
        let name = args.remove(0);
        return ChatInput::Script { name, args };
    }
    if line.is_empty() {
        ChatInput::Empty
    } else {
        ChatInput::Say(line.to_string())
    }
}

/// Read positions of the listener in every log it follows.
#[derive(Debug, Default)]
pub struct Cursors {
    logs: HashMap<(String, LogChannel), u64>,
    global: u64,
}

/// Messages logged since the last call by characters the players see, and
/// by the module itself. Private messages are only taken from player
/// characters.
pub fn collect_new(
    module: &Module,
    sight: &Sight,
    players: &[ObjectId],
    cursors: &mut Cursors,
) -> Vec<ChatLine> {
    let mut lines = Vec::new();
    for c in &module.characters {
        let is_player = players.iter().any(|p| c.is(p));
        let visible = is_player || sight.sees(c.position);
        for channel in LogChannel::ALL {
            let cursor = cursors.logs.entry((c.key(), channel)).or_insert(0);
            let log = c.log(channel);
            // Unseen lines are skipped for good, not held back.
            if !visible || (channel == LogChannel::Private && !is_player) {
                *cursor = log.last().map(|m| m.id).unwrap_or(*cursor);
                continue;
            }
            for message in log.since(*cursor) {
                lines.push(ChatLine {
                    time: message.time,
                    kind: channel.into(),
                    speaker: (channel == LogChannel::Chat).then(|| c.display_name().to_string()),
                    text: message.text.clone(),
                    translated: message.translated,
                });
                *cursor = message.id;
            }
        }
    }
    for message in module.log.since(cursors.global) {
        lines.push(ChatLine {
            time: message.time,
            kind: LineKind::System,
            speaker: None,
            text: message.text.clone(),
            translated: message.translated,
        });
        cursors.global = message.id;
    }
    lines
}

fn push_lines(feed: &Mutex<Vec<ChatLine>>, mut lines: Vec<ChatLine>) {
    if lines.is_empty() {
        return;
    }
    if let Ok(mut feed) = feed.lock() {
        feed.append(&mut lines);
        let excess = feed.len().saturating_sub(MAX_LINES);
        feed.drain(..excess);
    }
}

pub struct Chat {
    feed: Arc<Mutex<Vec<ChatLine>>>,
    /// Sorted copy of the feed taken at the start of each frame.
    shown: Vec<ChatLine>,
    input: String,
    focused: bool,
    scroll: usize,
    stop: Arc<AtomicBool>,
    listener: Option<thread::JoinHandle<()>>,
}

impl Chat {
    pub fn new() -> Self {
        Self {
            feed: Arc::new(Mutex::new(Vec::new())),
            shown: Vec::new(),
            input: String::new(),
            focused: false,
            scroll: 0,
            stop: Arc::new(AtomicBool::new(false)),
            listener: None,
        }
    }

    /// Starts the background listener following the logs of `game`.
    pub fn listen(&mut self, game: Arc<Game>) -> Result<(), String> {
        self.stop_listener();
        self.stop.store(false, Ordering::SeqCst);
        let feed = Arc::clone(&self.feed);
        let stop = Arc::clone(&self.stop);
        let handle = thread::Builder::new()
            .name("chat-listener".into())
            .spawn(move || {
                let mut cursors = Cursors::default();
                while !stop.load(Ordering::SeqCst) && !game.closing() {
                    let lines = match game.module().read() {
                        Ok(module) => {
                            let players = game.player_chars();
                            let sight = Sight::of(&module, &players);
                            collect_new(&module, &sight, &players, &mut cursors)
                        }
                        Err(_) => {
                            log::error!("Module lock poisoned, chat listener stops");
                            break;
                        }
                    };
                    push_lines(&feed, lines);
                    thread::sleep(TICK_INTERVAL);
                }
                log::debug!("Chat listener stopped");
            })
            .map_err(|e| format!("Failed to start chat listener: {e}"))?;
        self.listener = Some(handle);
        Ok(())
    }

    fn stop_listener(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.listener.take() {
            if handle.join().is_err() {
                log::error!("Chat listener panicked");
            }
        }
    }

    pub fn focused(&self) -> bool {
        self.focused
    }

    pub fn focus(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Appends a line from the HUD itself, e.g. console output.
    pub fn push_system(&self, text: &str) {
        let lines = text.lines().map(ChatLine::system).collect();
        push_lines(&self.feed, lines);
    }

    pub fn rect(rc: &RenderContext) -> Rect {
        let w = rc.su(BOX_W);
        let h = rc.su(BOX_H);
        Rect::new(rc.s(10), rc.height as i32 - h as i32 - rc.s(10), w, h)
    }

    fn submit(&mut self, ctx: &mut FrameCtx<'_>) {
        let line = std::mem::take(&mut self.input);
        match parse_input(&line, ctx.game.has_server()) {
            ChatInput::Console(command) => {
                self.push_system(&format!("{PROMPT}{command}"));
                ctx.act(HudAction::Console(command));
            }
            ChatInput::ServerCommand(command) => {
                self.push_system(&format!("{PROMPT}{command}"));
                ctx.game.send_command(&command);
            }
            ChatInput::Script { name, args } => ctx.act(HudAction::Script { name, args }),
            ChatInput::Say(text) => {
                if let Err(err) = ctx.game.chat(ctx.module, ctx.pc, &text) {
                    log::warn!("{err:#}");
                }
            }
            ChatInput::Empty => {}
        }
    }

    pub fn update(&mut self, ctx: &mut FrameCtx<'_>) {
        if let Ok(feed) = self.feed.lock() {
            self.shown = feed.clone();
        }
        self.shown.sort_by_key(|l| l.time);

        let rect = Self::rect(ctx.rc);
        if self.focused {
            self.input.push_str(&ctx.input.take_text());
            if ctx.input.take_key(Keycode::Backspace) {
                self.input.pop();
            }
            if ctx.input.take_key(Keycode::Escape) {
                self.input.clear();
                self.focused = false;
            }
        } else if ctx.input.take_left_click(rect) {
            self.focused = true;
        }
        if ctx.input.take_key(Keycode::Return) || ctx.input.take_key(Keycode::KpEnter) {
            if self.focused {
                self.submit(ctx);
            }
            self.focused = !self.focused;
            ctx.input.take_text();
        }
        if rect.contains_point(ctx.input.mouse()) && ctx.input.wheel() != 0 {
            let next = self.scroll as i64 + ctx.input.wheel() as i64;
            self.scroll = next.clamp(0, self.shown.len() as i64) as usize;
        }
        ctx.input.block(rect);
    }

    pub fn draw(&self, ctx: &mut DrawCtx<'_>) -> Result<(), String> {
        let rect = Self::rect(ctx.rc);
        render::draw_frame(ctx.canvas, rect, PANEL_BG, PANEL_BORDER)?;
        let pad = 6;
        let line_h = font_cache::LINE_H as i32;
        let input_y = rect.bottom() - line_h - pad;
        let max_chars = font_cache::chars_fitting(rect.width().saturating_sub(pad as u32 * 2));

        let mut rows: Vec<(String, Color)> = Vec::new();
        for line in &self.shown {
            let color = match line.kind {
                LineKind::Chat => TEXT_COLOR,
                LineKind::Combat => COMBAT_COLOR,
                LineKind::Private => PRIVATE_COLOR,
                LineKind::System => TEXT_DIM,
            };
            for wrapped in font_cache::wrap_text(&line.render(ctx.i18n), max_chars) {
                rows.push((wrapped, color));
            }
        }
        let fitting = ((input_y - rect.y() - pad) / line_h).max(0) as usize;
        let end = rows.len().saturating_sub(self.scroll.min(rows.len()));
        let start = end.saturating_sub(fitting);
        for (i, (text, color)) in rows[start..end].iter().enumerate() {
            font_cache::draw_text(ctx.canvas, text, rect.x() + pad, rect.y() + pad + i as i32 * line_h, *color)?;
        }

        let prompt = if self.focused {
            let tail: String = self
                .input
                .chars()
                .rev()
                .take(max_chars.saturating_sub(PROMPT.len() + 1))
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("{PROMPT}{tail}_")
        } else {
            PROMPT.to_string()
        };
        let color = if self.focused { TEXT_COLOR } else { TEXT_WARN };
        font_cache::draw_text(ctx.canvas, &prompt, rect.x() + pad, input_y, color)
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Chat {
    fn drop(&mut self) {
        self.stop_listener();
    }
}
