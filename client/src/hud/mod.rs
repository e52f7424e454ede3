//! HUD root: owns the area view, the camera and every panel, routes input
//! through them once per frame and draws them back to front.
//!
//! The module write lock is taken once per update. Console lines, scripts
//! and area scripts raised during the frame run after it is released.

pub mod cast_bar;
pub mod character_info;
pub mod chat;
pub mod crafting;
pub mod dialog;
pub mod gui_tool;
pub mod inventory;
pub mod journal;
pub mod loot;
pub mod menu_bar;
pub mod menus;
pub mod message_queue;
pub mod object_frame;
pub mod object_info;
pub mod panel;
pub mod skills;
pub mod slot;
pub mod trade;
pub mod training;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use egui_sdl2::egui;
use mural_core::types::{Module, ObjectId, Position, UseAction, UseTarget};
use sdl2::keyboard::Keycode;
use sdl2::pixels::Color;
use sdl2::rect::Point;
use sdl2::render::Canvas;
use sdl2::video::Window;

use crate::area::{AreaView, Hovered};
use crate::assets::AssetRegistry;
use crate::bindings::Bindings;
use crate::camera::{self, Camera, Pick};
use crate::filepaths::GuiPaths;
use crate::font_cache::{self, LINE_H, TEXT_COLOR, TEXT_WARN};
use crate::game::{Game, GameEvent, TOO_FAR};
use crate::i18n::I18n;
use crate::input::InputState;
use crate::layout::{CameraData, HudData, LayoutStore};
use crate::render::{self, RenderContext};
use crate::script_host::ScriptHost;
use crate::settings::Settings;

use character_info::CharacterInfoPanel;
use chat::Chat;
use crafting::CraftingPanel;
use dialog::DialogPanel;
use gui_tool::GuiCommand;
use inventory::InventoryPanel;
use journal::JournalPanel;
use loot::LootPanel;
use menu_bar::MenuBar;
use menus::{GameMenu, LoadMenu, SaveMenu};
use message_queue::{Confirm, Message, MessageQueue};
use object_frame::FrameSlot;
use panel::{FrameCtx, HudAction, Panel, PanelId};
use skills::SkillsPanel;
use slot::{Drag, DragSource};
use trade::TradePanel;
use training::TrainingPanel;

const LOADING: &str = "loading";
const AREA_LOAD_FAIL: &str = "area_load_fail";
const SAVE_DONE: &str = "save_done";
const SAVE_FAIL: &str = "save_fail";
const LOAD_FAIL: &str = "load_fail";
const SERVER_LOST: &str = "server_lost";
const REMOVE_ITEMS_Q: &str = "remove_items_q";
const PAUSED: &str = "paused";

const PANEL_KEYS: [(Keycode, PanelId); 5] = [
    (Keycode::B, PanelId::Inventory),
    (Keycode::K, PanelId::Skills),
    (Keycode::L, PanelId::Journal),
    (Keycode::V, PanelId::Crafting),
    (Keycode::C, PanelId::CharacterInfo),
];

/// Music track for an area: the first named after it, else the first one.
pub fn area_track<'a>(tracks: &'a [String], area: &str) -> Option<&'a String> {
    tracks
        .iter()
        .find(|t| t.starts_with(area))
        .or_else(|| tracks.first())
}

/// The sprite-drawn modal panels.
struct Panels {
    inventory: InventoryPanel,
    skills: SkillsPanel,
    loot: LootPanel,
    dialog: DialogPanel,
    journal: JournalPanel,
    crafting: CraftingPanel,
    character_info: CharacterInfoPanel,
    trade: TradePanel,
    training: TrainingPanel,
}

impl Panels {
    fn new() -> Self {
        Self {
            inventory: InventoryPanel::new(),
            skills: SkillsPanel::new(),
            loot: LootPanel::new(),
            dialog: DialogPanel::new(),
            journal: JournalPanel::new(),
            crafting: CraftingPanel::new(),
            character_info: CharacterInfoPanel::new(),
            trade: TradePanel::new(),
            training: TrainingPanel::new(),
        }
    }

    fn get(&self, id: PanelId) -> Option<&dyn Panel> {
        match id {
            PanelId::Inventory => Some(&self.inventory),
            PanelId::Skills => Some(&self.skills),
            PanelId::Loot => Some(&self.loot),
            PanelId::Dialog => Some(&self.dialog),
            PanelId::Journal => Some(&self.journal),
            PanelId::Crafting => Some(&self.crafting),
            PanelId::CharacterInfo => Some(&self.character_info),
            PanelId::Trade => Some(&self.trade),
            PanelId::Training => Some(&self.training),
            PanelId::Menu | PanelId::SaveMenu | PanelId::LoadMenu => None,
        }
    }

    fn get_mut(&mut self, id: PanelId) -> Option<&mut dyn Panel> {
        match id {
            PanelId::Inventory => Some(&mut self.inventory),
            PanelId::Skills => Some(&mut self.skills),
            PanelId::Loot => Some(&mut self.loot),
            PanelId::Dialog => Some(&mut self.dialog),
            PanelId::Journal => Some(&mut self.journal),
            PanelId::Crafting => Some(&mut self.crafting),
            PanelId::CharacterInfo => Some(&mut self.character_info),
            PanelId::Trade => Some(&mut self.trade),
            PanelId::Training => Some(&mut self.training),
            PanelId::Menu | PanelId::SaveMenu | PanelId::LoadMenu => None,
        }
    }
}

/// Area view being loaded in the background.
struct AreaLoad {
    key: (String, String),
    rx: Receiver<Result<AreaView, String>>,
    recenter: bool,
}

/// Work that needs the module lock released.
#[derive(Debug, Default)]
struct Deferred {
    console: Vec<String>,
    scripts: Vec<(String, Vec<String>)>,
    area_scripts: Option<PathBuf>,
}

pub struct Hud {
    game: Arc<Game>,
    paths: GuiPaths,
    i18n: I18n,
    rc: RenderContext,
    debug: bool,
    mouse: Point,

    camera: Camera,
    view: Option<AreaView>,
    area_load: Option<AreaLoad>,
    failed_area: Option<(String, String)>,
    restart_area: bool,
    loading: Option<String>,

    name: String,
    layouts: LayoutStore,
    modal: Option<PanelId>,
    panels: Panels,
    game_menu: GameMenu,
    save_menu: SaveMenu,
    load_menu: LoadMenu,
    menu_bar: MenuBar,
    chat: Chat,
    messages: MessageQueue,
    drag: Option<Drag>,
    hovered: Option<Hovered>,
    target: Option<ObjectId>,
    /// Player character the HUD was last built for.
    shown_pc: Option<ObjectId>,

    scripts: ScriptHost,
    gui_rx: Receiver<GuiCommand>,
    /// Actions raised by the egui menus, applied on the next update.
    pending: Vec<HudAction>,
    deferred: Deferred,
    clicks: usize,
    music_pending: bool,
    exiting: bool,
}

impl Hud {
    /// Builds the HUD for `game`, registers the `gui` console tool and
    /// starts the chat listener.
    pub fn new(game: Arc<Game>, paths: GuiPaths, i18n: I18n) -> Self {
        let gui_rx = gui_tool::register(game.console());
        let mut chat = Chat::new();
        if let Err(err) = chat.listen(Arc::clone(&game)) {
            log::error!("{err}");
        }
        let scripts = ScriptHost::new(Arc::clone(&game), paths.scripts_dir());
        Self {
            game,
            paths,
            i18n,
            rc: RenderContext::new(1, 1, false),
            debug: false,
            mouse: Point::new(0, 0),
            camera: Camera::new(),
            view: None,
            area_load: None,
            failed_area: None,
            restart_area: false,
            loading: None,
            name: String::new(),
            layouts: LayoutStore::new(),
            modal: None,
            panels: Panels::new(),
            game_menu: GameMenu::new(),
            save_menu: SaveMenu::new(),
            load_menu: LoadMenu::new(),
            menu_bar: MenuBar::new(),
            chat,
            messages: MessageQueue::new(),
            drag: None,
            hovered: None,
            target: None,
            shown_pc: None,
            scripts,
            gui_rx,
            pending: Vec::new(),
            deferred: Deferred::default(),
            clicks: 0,
            music_pending: false,
            exiting: false,
        }
    }

    pub fn game(&self) -> &Arc<Game> {
        &self.game
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn exit(&mut self) {
        log::info!("HUD exit requested");
        self.exiting = true;
    }

    pub fn exiting(&self) -> bool {
        self.exiting
    }

    pub fn open_loading_screen(&mut self, info: &str) {
        self.loading = Some(info.to_string());
    }

    pub fn close_loading_screen(&mut self) {
        self.loading = None;
    }

    /// Persistable state: save name, camera position and every layout.
    pub fn data(&self) -> HudData {
        let pos = self.camera.position();
        HudData {
            name: self.name.clone(),
            camera: CameraData { x: pos.x, y: pos.y },
            players: self.layouts.players(),
        }
    }

    pub fn apply(&mut self, data: HudData) {
        self.name = data.name;
        self.camera
            .set_position(Position::new(data.camera.x, data.camera.y));
        self.layouts.apply(&data.players);
        self.drag = None;
    }

    /// Runs one frame of input handling and game interaction.
    pub fn update(
        &mut self,
        input: &mut InputState,
        rc: &RenderContext,
        bindings: &mut Bindings,
        dt: f32,
    ) {
        self.rc = RenderContext {
            debug: self.debug,
            ..*rc
        };
        self.camera.resize(rc.width, rc.height, rc.scale);
        self.mouse = input.mouse();

        let mut actions = std::mem::take(&mut self.pending);
        self.handle_events(&mut actions);
        self.handle_gui_commands();
        let answers = self.messages.take_answers();

        let Some(pc) = self.game.active_player_char() else {
            input.block_all();
            return;
        };
        let shared = Arc::clone(self.game.module());
        let Ok(mut module) = shared.write() else {
            log::error!("Module lock poisoned, HUD frame skipped");
            return;
        };

        if self.shown_pc.as_ref() != Some(&pc) {
            self.switch_player(&mut module, &pc);
        }
        self.follow_area(&module, &pc);
        if self.loading.is_some() || self.view.is_none() {
            input.block_all();
            drop(module);
            self.run_deferred();
            return;
        }

        for (message, accepted) in answers {
            if let (true, Some(Confirm::ThrowItems(keys))) = (accepted, &message.confirm) {
                if let Err(err) = self.game.throw_items(&mut module, &pc, keys) {
                    log::warn!("{err:#}");
                }
                actions.push(HudAction::RefreshInventory);
            }
        }

        self.handle_keys(input, &mut actions);
        if !self.messages.is_empty() {
            self.chat.focus(false);
        }
        if !self.messages.is_empty() || self.modal.is_some_and(|m| m.is_menu()) {
            input.block_all();
        }

        let menu_locked = self.modal.is_some_and(|m| m.is_menu())
            || !self.messages.is_empty()
            || self.chat.focused();
        {
            let mut ctx = FrameCtx {
                game: self.game.as_ref(),
                module: &mut *module,
                pc: &pc,
                input: &mut *input,
                rc: &self.rc,
                layout: self.layouts.layout(&pc.id, &pc.serial),
                drag: &mut self.drag,
                actions: &mut actions,
            };
            if let Some(id) = self.modal {
                if let Some(panel) = self.panels.get_mut(id) {
                    panel.update(&mut ctx);
                }
            }
            self.menu_bar.lock(menu_locked);
            self.menu_bar.update(&mut ctx);
            self.chat.update(&mut ctx);
            object_frame::update(&mut ctx, &pc, FrameSlot::Player);
            let target = ctx.module.char(&pc).and_then(|c| c.targets.first().cloned());
            if let Some(target) = &target {
                object_frame::update(&mut ctx, target, FrameSlot::Target);
            }
            cast_bar::update(&mut ctx);
            drop_leftover_drag(&mut ctx, &self.panels.inventory);
        }

        let sight = self.game.sight(&module);
        self.camera.lock(self.modal.is_some() || self.chat.focused());
        if let Some(view) = self.view.as_mut() {
            view.update(&module, &sight, bindings, dt);
            if !self.camera.locked() {
                self.camera.update(input);
                let proj = self.camera.projection();
                if input.take_right_click(self.rc.screen()) {
                    let target = camera::target_at(view, &proj, self.mouse);
                    self.game.set_target(&mut module, &pc, target);
                }
                if input.take_left_click(self.rc.screen()) {
                    let teleport = self.debug && input.key_held(Keycode::LShift);
                    let pick = camera::pick(
                        &module,
                        view,
                        &proj,
                        &pc,
                        self.mouse,
                        self.game.paused(),
                        teleport,
                    );
                    apply_pick(&self.game, &mut module, &pc, pick, &mut actions);
                }
            }
            let proj = self.camera.projection();
            let index = view.avatar_index_at(&proj, self.mouse);
            view.set_hovered(index);
            self.hovered = view.hovered_at(&module, &proj, self.mouse);
        }
        self.target = module
            .char(&pc)
            .and_then(|c| c.targets.first().cloned());

        self.apply_actions(&mut module, &pc, actions);
        self.camera.lock(self.modal.is_some() || self.chat.focused());
        drop(module);
        self.run_deferred();
    }

    fn handle_events(&mut self, actions: &mut Vec<HudAction>) {
        let pc = self.game.active_player_char();
        for event in self.game.drain_events() {
            match event {
                GameEvent::Used { user, object } => {
                    log::debug!("{user} used {object}");
                    if pc.as_ref() == Some(&user) {
                        actions.push(HudAction::RefreshInventory);
                    }
                }
                GameEvent::PlayerAdded(oid) => log::info!("{oid} joined the HUD"),
                GameEvent::CommandResult { code, out } => {
                    log::debug!("Server command finished with {code}");
                    self.chat.push_system(&out);
                }
                GameEvent::ServerError(err) => self.messages.push(Message::info(err)),
                GameEvent::ServerLost => self.messages.push(Message::info(SERVER_LOST)),
            }
        }
    }

    fn handle_gui_commands(&mut self) {
        let commands: Vec<GuiCommand> = self.gui_rx.try_iter().collect();
        for command in commands {
            log::debug!("gui command {command:?}");
            match command {
                GuiCommand::Exit => self.exit(),
                GuiCommand::Pause => {
                    if !self.game.paused() {
                        self.game.pause();
                    }
                }
                GuiCommand::Resume => {
                    if self.game.paused() {
                        self.game.pause();
                    }
                }
                GuiCommand::Camera(pos) => self.camera.center_at(pos),
                GuiCommand::Restart => self.restart_area = true,
                GuiCommand::Msg(text) => self.messages.push(Message::info(text)),
            }
        }
    }

    /// Esc closes the message window first, then the open modal, and
    /// otherwise opens the menu. Other shortcuts wait while chat is focused.
    fn handle_keys(&mut self, input: &mut InputState, actions: &mut Vec<HudAction>) {
        if self.chat.focused() {
            return;
        }
        if input.take_key(Keycode::Escape) {
            if !self.messages.is_empty() {
                self.messages.close_front(false);
            } else if self.modal.is_some() {
                actions.push(HudAction::Close);
            } else {
                actions.push(HudAction::Open(PanelId::Menu));
            }
        }
        if !self.messages.is_empty() {
            return;
        }
        if input.take_key(Keycode::Backquote) {
            self.debug = !self.debug;
            self.rc.debug = self.debug;
            log::info!("Debug mode {}", if self.debug { "on" } else { "off" });
        }
        if self.modal.is_some_and(|m| m.is_menu()) {
            return;
        }
        if input.take_key(Keycode::Space) {
            self.game.pause();
        }
        if input.take_key(Keycode::Tab) {
            self.game.next_player_char();
        }
        for (key, id) in PANEL_KEYS {
            if input.take_key(key) {
                actions.push(HudAction::Toggle(id));
            }
        }
    }

    /// Rebuilds the HUD around a new active player character: the open
    /// panel, drag and target belong to the previous one.
    fn switch_player(&mut self, module: &mut Module, pc: &ObjectId) {
        let Some(previous) = self.shown_pc.replace(pc.clone()) else {
            return;
        };
        log::info!("HUD follows {pc} instead of {previous}");
        self.close_modal(module, &previous);
        self.drag = None;
        self.hovered = None;
        self.target = None;
        let Some(c) = module.char(pc) else {
            return;
        };
        let same_area = self
            .view
            .as_ref()
            .is_some_and(|v| v.chapter() == module.chapter.id && v.id() == c.area);
        if same_area {
            self.camera.center_at(c.position);
        }
    }

    fn follow_area(&mut self, module: &Module, pc: &ObjectId) {
        self.poll_area_load(module, pc);
        let Some(c) = module.char(pc) else {
            return;
        };
        let key = (module.chapter.id.clone(), c.area.clone());
        let restart = std::mem::take(&mut self.restart_area);
        if restart {
            self.failed_area = None;
        }
        let current = self
            .view
            .as_ref()
            .is_some_and(|v| v.chapter() == key.0 && v.id() == key.1);
        let in_flight = self.area_load.as_ref().is_some_and(|l| l.key == key);
        if (current && !restart) || in_flight || self.failed_area.as_ref() == Some(&key) {
            return;
        }
        self.request_area(key, !current);
    }

    fn request_area(&mut self, key: (String, String), recenter: bool) {
        let (tx, rx) = mpsc::channel();
        let paths = self.paths.clone();
        let (chapter, area) = key.clone();
        let spawned = thread::Builder::new()
            .name("area-load".into())
            .spawn(move || {
                let _ = tx.send(AreaView::load(&paths, &chapter, &area));
            });
        if let Err(err) = spawned {
            log::error!("Failed to start area loader: {err}");
            self.failed_area = Some(key);
            self.messages.push(Message::info(AREA_LOAD_FAIL));
            return;
        }
        log::info!("Loading area {}/{}", key.0, key.1);
        self.open_loading_screen(LOADING);
        self.area_load = Some(AreaLoad { key, rx, recenter });
    }

    fn poll_area_load(&mut self, module: &Module, pc: &ObjectId) {
        let Some(load) = &self.area_load else {
            return;
        };
        let result = match load.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err("area loader stopped".to_string()),
        };
        let Some(load) = self.area_load.take() else {
            return;
        };
        self.close_loading_screen();
        match result {
            Ok(view) => {
                let center = if load.recenter {
                    module.char(pc).map(|c| c.position)
                } else {
                    None
                };
                self.install_view(view, center);
            }
            Err(err) => {
                log::error!("Failed to load area {}/{}: {err}", load.key.0, load.key.1);
                self.failed_area = Some(load.key);
                self.messages.push(Message::info(AREA_LOAD_FAIL));
            }
        }
    }

    fn install_view(&mut self, view: AreaView, center: Option<Position>) {
        self.camera.set_area(&view);
        if let Some(pos) = center {
            self.camera.center_at(pos);
        }
        log::info!("Area view ready: {}/{}", view.chapter(), view.id());
        self.deferred.area_scripts = Some(self.paths.area_scripts(view.chapter(), view.id()));
        self.hovered = None;
        self.view = Some(view);
        self.music_pending = true;
    }

    fn apply_actions(&mut self, module: &mut Module, pc: &ObjectId, actions: Vec<HudAction>) {
        for action in actions {
            match action {
                HudAction::Toggle(id) => {
                    if self.modal == Some(id) {
                        self.close_modal(module, pc);
                    } else {
                        self.open_modal(id, module, pc);
                    }
                }
                HudAction::Open(id) => self.open_modal(id, module, pc),
                HudAction::Close => self.close_modal(module, pc),
                HudAction::Loot(oid) => {
                    self.close_modal(module, pc);
                    self.panels.loot.open(oid);
                    self.open_modal(PanelId::Loot, module, pc);
                }
                HudAction::Talk(oid) => {
                    self.close_modal(module, pc);
                    self.panels.dialog.open(oid);
                    self.open_modal(PanelId::Dialog, module, pc);
                }
                HudAction::Trade(oid) => {
                    self.close_modal(module, pc);
                    self.panels.trade.open(oid);
                    self.open_modal(PanelId::Trade, module, pc);
                }
                HudAction::Train(oid) => {
                    self.close_modal(module, pc);
                    self.panels.training.open(oid);
                    self.open_modal(PanelId::Training, module, pc);
                }
                HudAction::Message(message) => self.messages.push(message),
                HudAction::Console(line) => self.deferred.console.push(line),
                HudAction::Script { name, args } => self.deferred.scripts.push((name, args)),
                HudAction::Save(name) => self.save(module, pc, &name),
                HudAction::Load(name) => self.load(module, pc, &name),
                HudAction::RefreshInventory => {
                    if self.modal == Some(PanelId::Inventory) {
                        let layout = self.layouts.layout(&pc.id, &pc.serial);
                        self.panels.inventory.refresh(module, pc, layout);
                    }
                }
                HudAction::Exit => self.exit(),
                HudAction::Click => self.clicks += 1,
            }
        }
    }

    fn open_modal(&mut self, id: PanelId, module: &mut Module, pc: &ObjectId) {
        if self.modal == Some(id) {
            return;
        }
        self.close_modal(module, pc);
        match id {
            PanelId::Menu => self.game_menu.reset(),
            PanelId::SaveMenu => {
                self.save_menu.refresh(self.paths.list_saves());
                self.save_menu.set_name(&self.name);
            }
            PanelId::LoadMenu => self.load_menu.refresh(self.paths.list_saves()),
            _ => {
                if let Some(panel) = self.panels.get_mut(id) {
                    let layout = self.layouts.layout(&pc.id, &pc.serial);
                    panel.show(module, pc, layout);
                }
            }
        }
        log::debug!("Opened {id:?}");
        self.chat.focus(false);
        self.modal = Some(id);
    }

    /// Closes the open modal; closing the dialog window ends the dialog.
    fn close_modal(&mut self, module: &mut Module, pc: &ObjectId) {
        let Some(id) = self.modal.take() else {
            return;
        };
        if id == PanelId::Dialog {
            if let Some(owner) = self.panels.dialog.owner().cloned() {
                if module.active_dialog(&owner, pc).is_some() {
                    if let Err(err) = self.game.end_dialog(module, &owner, pc) {
                        log::warn!("{err:#}");
                    }
                }
            }
        }
        log::debug!("Closed {id:?}");
    }

    /// Writes the HUD data next to an engine export, or asks the server to
    /// save its state when one is attached.
    fn save(&mut self, module: &mut Module, pc: &ObjectId, name: &str) {
        if !menus::valid_save_name(name) {
            self.messages.push(Message::info(SAVE_FAIL));
            return;
        }
        self.name = name.to_string();
        let engine = if self.game.has_server() {
            self.game.save_on_server(name);
            Ok(())
        } else {
            module
                .export(&self.paths.module_save(name))
                .map_err(|e| format!("{e:#}"))
        };
        match engine.and_then(|()| self.data().save(&self.paths.hud_save(name))) {
            Ok(()) => {
                log::info!("Game saved as {name}");
                self.close_modal(module, pc);
                self.messages.push(Message::info(SAVE_DONE));
            }
            Err(err) => {
                log::error!("Save {name} failed: {err}");
                self.messages.push(Message::info(SAVE_FAIL));
            }
        }
    }

    fn load(&mut self, module: &mut Module, pc: &ObjectId, name: &str) {
        let data = match HudData::load(&self.paths.hud_save(name)) {
            Ok(data) => data,
            Err(err) => {
                log::error!("{err}");
                self.messages.push(Message::info(LOAD_FAIL));
                return;
            }
        };
        if self.game.has_server() {
            self.game.load_on_server(name);
        } else {
            match Module::load(&self.paths.module_save(name)) {
                Ok(loaded) => *module = loaded,
                Err(err) => {
                    log::error!("{err:#}");
                    self.messages.push(Message::info(LOAD_FAIL));
                    return;
                }
            }
        }
        log::info!("Game {name} loaded");
        self.modal = None;
        self.apply(data);
        self.restart_area = true;
        if let Some(c) = module.char(pc) {
            log::debug!("{} is in {}", c.display_name(), c.area);
        }
    }

    fn run_deferred(&mut self) {
        let deferred = std::mem::take(&mut self.deferred);
        if let Some(dir) = deferred.area_scripts {
            self.scripts.change_area(&dir);
        }
        for line in deferred.console {
            let result = self.game.console().execute(self.game.module(), &line);
            if !result.success() {
                log::warn!("Command '{line}' failed: {}", result.out);
            }
            if !result.out.is_empty() {
                self.chat.push_system(&result.out);
            }
        }
        for (name, args) in deferred.scripts {
            if let Err(err) = self.scripts.run_named(&name, args) {
                log::error!("{err}");
                self.chat.push_system(&err);
            }
        }
    }

    /// Draws the world and the sprite-drawn HUD, back to front.
    pub fn draw(
        &mut self,
        canvas: &mut Canvas<Window>,
        assets: &mut AssetRegistry,
    ) -> Result<(), String> {
        for _ in 0..std::mem::take(&mut self.clicks) {
            assets.play_click();
        }
        if let Some(view) = self.view.as_mut() {
            for sound in view.take_sounds() {
                assets.sfx.play_effect(&sound);
            }
            if std::mem::take(&mut self.music_pending) {
                let tracks = assets.sfx.music_tracks();
                if let Some(track) = area_track(&tracks, view.id()) {
                    assets.sfx.play_music(track);
                }
            }
        }

        let shared = Arc::clone(self.game.module());
        let module = shared
            .read()
            .map_err(|_| "Module lock poisoned".to_string())?;
        let pc = self.game.active_player_char();
        let (Some(view), Some(pc), None) = (&self.view, pc, &self.loading) else {
            return self.draw_loading(canvas);
        };

        let proj = self.camera.projection();
        let sight = self.game.sight(&module);
        view.draw(canvas, assets, &module, &proj, &sight, &self.rc)?;

        let mut ctx = panel::DrawCtx {
            canvas,
            assets,
            module: &module,
            pc: &pc,
            rc: &self.rc,
            i18n: &self.i18n,
            layout: self.layouts.get(&pc.id, &pc.serial),
            drag: self.drag.as_ref(),
            mouse: self.mouse,
        };
        self.menu_bar.draw(&mut ctx)?;
        self.chat.draw(&mut ctx)?;
        object_frame::draw_frame(&mut ctx, &pc, FrameSlot::Player, view.avatar(&pc))?;
        if let Some(target) = &self.target {
            object_frame::draw_frame(&mut ctx, target, FrameSlot::Target, view.avatar(target))?;
        }
        if let Some(panel) = self.modal.and_then(|id| self.panels.get(id)) {
            panel.draw(&mut ctx)?;
        }
        if let Some(hovered) = &self.hovered {
            object_info::draw(&mut ctx, hovered)?;
        }
        cast_bar::draw(&mut ctx, view.avatar(&pc))?;
        slot::draw_drag(&mut ctx)?;

        if self.game.paused() {
            font_cache::draw_text_centered(
                ctx.canvas,
                self.i18n.text(PAUSED),
                self.rc.center().x(),
                self.rc.s(12),
                TEXT_WARN,
            )?;
        }
        if self.debug {
            self.draw_debug(ctx.canvas)?;
        }
        Ok(())
    }

    fn draw_loading(&self, canvas: &mut Canvas<Window>) -> Result<(), String> {
        let info = self.loading.as_deref().unwrap_or(LOADING);
        render::fill_rect(canvas, self.rc.screen(), Color::RGB(0, 0, 0))?;
        font_cache::draw_text_centered(
            canvas,
            self.i18n.text(info),
            self.rc.center().x(),
            self.rc.center().y(),
            TEXT_COLOR,
        )
    }

    fn draw_debug(&self, canvas: &mut Canvas<Window>) -> Result<(), String> {
        let camera = self.camera.position();
        let cursor = self.camera.conv_screen_to_world(self.mouse);
        let lines = [
            format!("camera {:.0},{:.0}", camera.x, camera.y),
            format!("cursor {:.0},{:.0}", cursor.x, cursor.y),
        ];
        let width = lines
            .iter()
            .map(|l| font_cache::text_width(l))
            .max()
            .unwrap_or(0) as i32;
        for (i, line) in lines.iter().enumerate() {
            font_cache::draw_text(
                canvas,
                line,
                self.rc.width as i32 - width - 10,
                10 + i as i32 * LINE_H as i32,
                TEXT_COLOR,
            )?;
        }
        Ok(())
    }

    /// Draws the egui menus and the message window. Returns `true` when a
    /// setting was changed.
    pub fn render_ui(&mut self, ctx: &egui::Context, settings: &mut Settings) -> bool {
        let mut changed = false;
        match self.modal {
            Some(PanelId::Menu) => {
                changed = self
                    .game_menu
                    .show(ctx, &self.i18n, settings, &mut self.pending);
            }
            Some(PanelId::SaveMenu) => self.save_menu.show(ctx, &self.i18n, &mut self.pending),
            Some(PanelId::LoadMenu) => self.load_menu.show(ctx, &self.i18n, &mut self.pending),
            _ => {}
        }
        self.messages.show(ctx, &self.i18n);
        changed
    }
}

impl Drop for Hud {
    fn drop(&mut self) {
        gui_tool::unregister(self.game.console());
        self.scripts.stop_all();
    }
}

/// A click nobody took while something is dragged drops it: inventory
/// items ask to be thrown away, bar slots are cleared.
fn drop_leftover_drag(ctx: &mut FrameCtx<'_>, inventory: &InventoryPanel) {
    if ctx.drag.is_none() {
        return;
    }
    let screen = ctx.rc.screen();
    if ctx.input.take_right_click(screen) {
        *ctx.drag = None;
        return;
    }
    if !ctx.input.take_left_click(screen) {
        return;
    }
    let Some(drag) = ctx.drag.take() else {
        return;
    };
    match drag.source {
        DragSource::Inventory(_) => {
            if let Some(keys) = inventory::dragged_keys(inventory, &drag) {
                ctx.act(HudAction::Message(Message::confirm(
                    REMOVE_ITEMS_Q,
                    Confirm::ThrowItems(keys),
                )));
            }
        }
        DragSource::Bar(index) => ctx.layout.clear_bar_slot(index),
        DragSource::Skills => {}
    }
}

fn apply_pick(
    game: &Game,
    module: &mut Module,
    pc: &ObjectId,
    pick: Pick,
    actions: &mut Vec<HudAction>,
) {
    match pick {
        Pick::Nothing => {}
        Pick::Use(target) => {
            game.set_target(module, pc, Some(target.clone()));
            let _ = game.use_action(module, pc, UseAction::Hit, UseTarget::Char(target));
        }
        Pick::Loot(target) => actions.push(HudAction::Loot(target)),
        Pick::Dialog { owner, dialog } => match game.start_dialog(module, &owner, pc, &dialog) {
            Ok(()) => actions.push(HudAction::Talk(owner)),
            Err(err) => log::warn!("{err:#}"),
        },
        Pick::TooFar { approach: Some(pos) } => game.approach(module, pc, pos),
        Pick::TooFar { approach: None } => game.refuse(module, pc, TOO_FAR),
        Pick::Move(pos) => game.move_to(module, pc, pos),
        Pick::Teleport(pos) => game.set_pos(module, pc, pos),
    }
}
