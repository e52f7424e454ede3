//! Game mediator: owns the shared engine module, tracks player characters
//! and either ticks the module locally or relays intents to a server.
//!
//! Every intent mutates the local module first so the HUD stays responsive,
//! then, with a server attached, sends the matching request. Server updates
//! overwrite the local state later on.

pub mod server;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::bail;
use mural_core::ai::AiDriver;
use mural_core::console::Console;
use mural_core::constants::ACTION_RANGE;
use mural_core::protocol::{
    ChatRequest, CommandRequest, DialogAnswerRequest, DialogEndRequest, DialogRequest,
    EquipRequest, LoginRequest, MoveRequest, NewCharRequest, Request, Response, TargetRequest,
    ThrowItemsRequest, TradeRequest, TrainingRequest, TransferItemsRequest, UseRequest,
};
use mural_core::types::{
    Module, ObjectId, Position, UseAction, UseError, UseOutcome, UseTarget,
};
use mural_core::SharedModule;

use server::ServerLink;

/// Translation id shown when a click target is out of reach.
pub const TOO_FAR: &str = "tar_too_far";

/// Pause between two engine ticks.
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Positions and sight ranges of the player characters, taken once per
/// frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sight(Vec<(Position, f64)>);

impl Sight {
    pub fn new(eyes: Vec<(Position, f64)>) -> Self {
        Self(eyes)
    }

    pub fn of(module: &Module, players: &[ObjectId]) -> Self {
        Self(
            players
                .iter()
                .filter_map(|oid| module.char(oid))
                .map(|c| (c.position, c.sight_range))
                .collect(),
        )
    }

    /// `true` when any player character is within its sight range of `pos`.
    pub fn sees(&self, pos: Position) -> bool {
        self.0.iter().any(|(eye, range)| eye.distance(&pos) <= *range)
    }
}

/// Things background workers report to the UI thread.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// A use resolved; the HUD refreshes the panels showing the user.
    Used { user: ObjectId, object: String },
    PlayerAdded(ObjectId),
    CommandResult { code: i32, out: String },
    ServerError(String),
    ServerLost,
}

pub struct Game {
    module: SharedModule,
    console: Console,
    players: Mutex<Vec<ObjectId>>,
    active: Mutex<Option<ObjectId>>,
    paused: AtomicBool,
    closing: AtomicBool,
    server: Mutex<Option<ServerLink>>,
    events_tx: mpsc::Sender<GameEvent>,
    events_rx: Mutex<mpsc::Receiver<GameEvent>>,
}

fn item_ids(module: &Module, owner: &ObjectId, keys: &[String]) -> Vec<ObjectId> {
    let Some(inv) = module.inventory(owner) else {
        return Vec::new();
    };
    keys.iter()
        .filter_map(|k| inv.item_by_key(k))
        .map(|i| i.object_id())
        .collect()
}

impl Game {
    pub fn new(module: SharedModule, console: Console) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            module,
            console,
            players: Mutex::new(Vec::new()),
            active: Mutex::new(None),
            paused: AtomicBool::new(false),
            closing: AtomicBool::new(false),
            server: Mutex::new(None),
            events_tx,
            events_rx: Mutex::new(events_rx),
        }
    }

    pub fn module(&self) -> &SharedModule {
        &self.module
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    // Player characters.

    pub fn player_chars(&self) -> Vec<ObjectId> {
        self.players.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Adds a player character once; the first one becomes active.
    pub fn add_player_char(&self, oid: ObjectId) -> bool {
        let Ok(mut players) = self.players.lock() else {
            log::error!("Player list lock poisoned");
            return false;
        };
        if players.contains(&oid) {
            return false;
        }
        log::info!("Player character {} added", oid);
        players.push(oid.clone());
        drop(players);
        if let Ok(mut active) = self.active.lock() {
            if active.is_none() {
                *active = Some(oid);
            }
        }
        true
    }

    pub fn active_player_char(&self) -> Option<ObjectId> {
        self.active.lock().ok().and_then(|a| a.clone())
    }

    /// Makes `oid` the active player character. Characters the player does
    /// not control are refused.
    pub fn set_active_player_char(&self, oid: ObjectId) -> bool {
        if !self.is_player_char(&oid) {
            log::warn!("{oid} is not a player character");
            return false;
        }
        let Ok(mut active) = self.active.lock() else {
            return false;
        };
        if active.as_ref() == Some(&oid) {
            return false;
        }
        log::info!("Active player character is now {oid}");
        *active = Some(oid);
        true
    }

    /// Activates the player character after the active one, wrapping around.
    pub fn next_player_char(&self) -> bool {
        let players = self.player_chars();
        let active = self.active_player_char();
        let next = active
            .and_then(|a| players.iter().position(|p| *p == a))
            .map(|i| (i + 1) % players.len())
            .unwrap_or(0);
        match players.get(next) {
            Some(oid) => self.set_active_player_char(oid.clone()),
            None => false,
        }
    }

    pub fn is_player_char(&self, oid: &ObjectId) -> bool {
        self.players.lock().is_ok_and(|p| p.contains(oid))
    }

    pub fn sight(&self, module: &Module) -> Sight {
        Sight::of(module, &self.player_chars())
    }

    pub fn visible_for_player(&self, module: &Module, x: f64, y: f64) -> bool {
        self.sight(module).sees(Position::new(x, y))
    }

    // Run state.

    pub fn paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn set_pause(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    /// Toggles the pause. With a server attached only the request goes out;
    /// the flag flips when an update says so.
    pub fn pause(&self) {
        let wanted = !self.paused();
        if self.has_server() {
            self.send(Request {
                pause: Some(wanted),
                ..Default::default()
            });
        } else {
            self.set_pause(wanted);
        }
    }

    pub fn closing(&self) -> bool {
        self.closing.load(Ordering::Relaxed)
    }

    pub fn close(&self) {
        self.closing.store(true, Ordering::Relaxed);
        if let Some(link) = self.server_link() {
            link.shutdown();
        }
    }

    // Server.

    pub fn set_server(&self, link: Option<ServerLink>) {
        if let Ok(mut server) = self.server.lock() {
            *server = link;
        }
    }

    fn server_link(&self) -> Option<ServerLink> {
        self.server.lock().ok().and_then(|s| s.clone())
    }

    pub fn has_server(&self) -> bool {
        self.server.lock().is_ok_and(|s| s.is_some())
    }

    fn send(&self, request: Request) {
        let Some(link) = self.server_link() else {
            return;
        };
        if !link.send(request) {
            log::error!("Server link closed, continuing locally");
            self.set_server(None);
        }
    }

    /// Called by the reader when the connection ends.
    pub fn server_lost(&self) {
        if self.closing() {
            return;
        }
        log::error!("Lost connection to server");
        self.set_server(None);
        let _ = self.events_tx.send(GameEvent::ServerLost);
    }

    pub fn login(&self, login: &str, password: &str) {
        self.send(Request {
            login: vec![LoginRequest {
                login: login.to_string(),
                password: password.to_string(),
            }],
            ..Default::default()
        });
    }

    pub fn new_char(&self, template: &str, name: &str) {
        self.send(Request {
            new_char: vec![NewCharRequest {
                template: template.to_string(),
                name: name.to_string(),
            }],
            ..Default::default()
        });
    }

    pub fn save_on_server(&self, name: &str) {
        self.send(Request {
            save: Some(name.to_string()),
            ..Default::default()
        });
    }

    pub fn load_on_server(&self, name: &str) {
        self.send(Request {
            load: Some(name.to_string()),
            ..Default::default()
        });
    }

    pub fn send_command(&self, command: &str) {
        self.send(Request {
            command: vec![CommandRequest {
                command: command.to_string(),
            }],
            ..Default::default()
        });
    }

    /// Applies a server response. Runs on the reader thread.
    pub fn handle_response(&self, response: Response) {
        if let Some(update) = response.update {
            match self.module.write() {
                Ok(mut module) => *module = update.module,
                Err(_) => log::error!("Module lock poisoned, update dropped"),
            }
            self.set_pause(update.paused);
        }
        for c in response.character {
            let oid = ObjectId::new(c.id, c.serial);
            if self.add_player_char(oid.clone()) {
                let _ = self.events_tx.send(GameEvent::PlayerAdded(oid));
            }
        }
        for used in response.use_ {
            let _ = self.events_tx.send(GameEvent::Used {
                user: ObjectId::new(used.user_id, used.user_serial),
                object: used.object_id,
            });
        }
        for result in response.command {
            let _ = self.events_tx.send(GameEvent::CommandResult {
                code: result.result,
                out: result.out,
            });
        }
        for err in response.error {
            log::error!("Server error: {err}");
            let _ = self.events_tx.send(GameEvent::ServerError(err));
        }
    }

    /// Events raised since the last call, oldest first.
    pub fn drain_events(&self) -> Vec<GameEvent> {
        match self.events_rx.lock() {
            Ok(rx) => rx.try_iter().collect(),
            Err(_) => Vec::new(),
        }
    }

    // Tick worker.

    /// Starts the engine tick on its own thread. It runs until
    /// [`Game::close`].
    pub fn start(self: &Arc<Self>) -> Result<thread::JoinHandle<()>, String> {
        let game = Arc::clone(self);
        thread::Builder::new()
            .name("engine-tick".into())
            .spawn(move || game.update_loop())
            .map_err(|e| format!("Failed to start engine tick: {e}"))
    }

    fn update_loop(&self) {
        let mut ai = AiDriver::new();
        let mut last = Instant::now();
        let mut carry = Duration::ZERO;
        while !self.closing() {
            let now = Instant::now();
            carry += now - last;
            last = now;
            if self.paused() {
                carry = Duration::ZERO;
            } else {
                let delta_ms = carry.as_millis() as u64;
                carry -= Duration::from_millis(delta_ms);
                self.tick(&mut ai, delta_ms);
            }
            thread::sleep(TICK_INTERVAL);
        }
        log::debug!("Engine tick stopped");
    }

    fn tick(&self, ai: &mut AiDriver, delta_ms: u64) {
        let Ok(mut module) = self.module.write() else {
            log::error!("Module lock poisoned, tick skipped");
            return;
        };
        module.update(delta_ms);
        if !self.has_server() {
            ai.refresh(&module);
            ai.update(&mut module);
        }
    }

    // Intents.

    pub fn move_to(&self, module: &mut Module, oid: &ObjectId, pos: Position) {
        match module.char_mut(oid) {
            Some(c) => c.set_dest_point(pos),
            None => log::warn!("Move for unknown character {}", oid),
        }
        self.send(Request {
            move_: vec![MoveRequest {
                id: oid.id.clone(),
                serial: oid.serial.clone(),
                pos_x: pos.x,
                pos_y: pos.y,
            }],
            ..Default::default()
        });
    }

    pub fn set_pos(&self, module: &mut Module, oid: &ObjectId, pos: Position) {
        match module.char_mut(oid) {
            Some(c) => c.set_position(pos),
            None => log::warn!("Set position for unknown character {}", oid),
        }
        self.send(Request {
            set_pos: vec![MoveRequest {
                id: oid.id.clone(),
                serial: oid.serial.clone(),
                pos_x: pos.x,
                pos_y: pos.y,
            }],
            ..Default::default()
        });
    }

    pub fn set_target(&self, module: &mut Module, oid: &ObjectId, target: Option<ObjectId>) {
        let targets: Vec<ObjectId> = target.iter().cloned().collect();
        if let Err(err) = module.set_targets(oid, targets) {
            log::warn!("{err}");
        }
        let (target_id, target_serial) = target
            .map(|t| (t.id, t.serial))
            .unwrap_or_default();
        self.send(Request {
            target: vec![TargetRequest {
                id: oid.id.clone(),
                serial: oid.serial.clone(),
                target_id,
                target_serial,
            }],
            ..Default::default()
        });
    }

    /// Shows a translated refusal to the player.
    pub fn refuse(&self, module: &mut Module, oid: &ObjectId, text_id: &str) {
        if let Some(c) = module.char_mut(oid) {
            c.private_log.add_translated(text_id);
        }
    }

    /// Tells the player the target is too far and walks towards it.
    pub fn approach(&self, module: &mut Module, oid: &ObjectId, target: Position) {
        self.refuse(module, oid, TOO_FAR);
        let dest = Position::new(target.x - ACTION_RANGE, target.y);
        self.move_to(module, oid, dest);
    }

    fn use_request(
        module: &Module,
        user: &ObjectId,
        action: &UseAction,
        target: &UseTarget,
    ) -> Request {
        let (target_id, target_serial) = match target {
            UseTarget::Char(t) => (t.id.clone(), t.serial.clone()),
            UseTarget::Auto => (String::new(), String::new()),
        };
        let (object_id, object_serial, target_id, target_serial) = match action {
            UseAction::Training { trainer, training } => {
                return Request {
                    training: vec![TrainingRequest {
                        trainer_id: trainer.id.clone(),
                        trainer_serial: trainer.serial.clone(),
                        trainee_id: user.id.clone(),
                        trainee_serial: user.serial.clone(),
                        training_id: training.clone(),
                    }],
                    ..Default::default()
                };
            }
            // An attack uses the target character itself.
            UseAction::Hit => (target_id, target_serial, String::new(), String::new()),
            UseAction::Skill(id) | UseAction::Recipe(id) => {
                (id.clone(), String::new(), target_id, target_serial)
            }
            UseAction::Item(key) => {
                let (id, serial) = item_ids(module, user, std::slice::from_ref(key))
                    .pop()
                    .map(|i| (i.id, i.serial))
                    .unwrap_or_else(|| (key.clone(), String::new()));
                (id, serial, target_id, target_serial)
            }
        };
        Request {
            use_: vec![UseRequest {
                user_id: user.id.clone(),
                user_serial: user.serial.clone(),
                object_id,
                object_serial,
                target_id,
                target_serial,
            }],
            ..Default::default()
        }
    }

    /// Uses `action` as `user`. Refusals are shown to the player; a target
    /// out of range also makes the player walk towards it. Without a server
    /// a [`GameEvent::Used`] is raised at once, with one it waits for the
    /// server's confirmation.
    pub fn use_action(
        &self,
        module: &mut Module,
        user: &ObjectId,
        action: UseAction,
        target: UseTarget,
    ) -> Result<UseOutcome, UseError> {
        let request = Self::use_request(module, user, &action, &target);
        let object = match request.use_.first() {
            Some(u) => u.object_id.clone(),
            None => match &action {
                UseAction::Training { training, .. } => training.clone(),
                _ => String::new(),
            },
        };
        let result = module.use_action(user, action, target);
        match &result {
            Ok(_) => {
                if !self.has_server() {
                    let _ = self.events_tx.send(GameEvent::Used {
                        user: user.clone(),
                        object,
                    });
                }
            }
            Err(err) => {
                log::debug!("{} cannot use {}: {}", user, object, err);
                self.refuse(module, user, err.text_id());
                if let UseError::Range { range, target } = err {
                    if let Some(c) = module.char_mut(user) {
                        c.move_close_to(*target, *range);
                    }
                }
            }
        }
        self.send(request);
        result
    }

    pub fn equip(&self, module: &mut Module, oid: &ObjectId, item_key: &str) -> anyhow::Result<()> {
        let item = item_ids(module, oid, &[item_key.to_string()]).pop();
        let result = module.equip(oid, item_key);
        if let Some(item) = item {
            self.send(Request {
                equip: vec![EquipRequest {
                    char_id: oid.id.clone(),
                    char_serial: oid.serial.clone(),
                    item_id: item.id,
                    item_serial: item.serial,
                }],
                ..Default::default()
            });
        }
        result
    }

    pub fn unequip(&self, module: &mut Module, oid: &ObjectId, item_key: &str) -> anyhow::Result<()> {
        let item = item_ids(module, oid, &[item_key.to_string()]).pop();
        let result = module.unequip(oid, item_key);
        if let Some(item) = item {
            self.send(Request {
                unequip: vec![EquipRequest {
                    char_id: oid.id.clone(),
                    char_serial: oid.serial.clone(),
                    item_id: item.id,
                    item_serial: item.serial,
                }],
                ..Default::default()
            });
        }
        result
    }

    pub fn throw_items(
        &self,
        module: &mut Module,
        oid: &ObjectId,
        item_keys: &[String],
    ) -> anyhow::Result<()> {
        let items = item_ids(module, oid, item_keys);
        let result = module.throw_items(oid, item_keys);
        self.send(Request {
            throw_items: vec![ThrowItemsRequest {
                object_id: oid.id.clone(),
                object_serial: oid.serial.clone(),
                items,
            }],
            ..Default::default()
        });
        result
    }

    pub fn transfer_items(
        &self,
        module: &mut Module,
        from: &ObjectId,
        to: &ObjectId,
        item_keys: &[String],
    ) -> anyhow::Result<()> {
        let items = item_ids(module, from, item_keys);
        let result = module.transfer_items(from, to, item_keys);
        self.send(Request {
            transfer_items: vec![TransferItemsRequest {
                object_from_id: from.id.clone(),
                object_from_serial: from.serial.clone(),
                object_to_id: to.id.clone(),
                object_to_serial: to.serial.clone(),
                items,
            }],
            ..Default::default()
        });
        result
    }

    pub fn trade(
        &self,
        module: &mut Module,
        seller: &ObjectId,
        buyer: &ObjectId,
        buy: &[String],
        sell: &[String],
    ) -> anyhow::Result<()> {
        let items_buy = item_ids(module, seller, buy);
        let items_sell = item_ids(module, buyer, sell);
        let result = module.trade(seller, buyer, buy, sell);
        self.send(Request {
            trade: vec![TradeRequest {
                seller_id: seller.id.clone(),
                seller_serial: seller.serial.clone(),
                buyer_id: buyer.id.clone(),
                buyer_serial: buyer.serial.clone(),
                items_buy,
                items_sell,
            }],
            ..Default::default()
        });
        result
    }

    pub fn chat(&self, module: &mut Module, oid: &ObjectId, text: &str) -> anyhow::Result<()> {
        let result = module.chat(oid, text);
        self.send(Request {
            chat: vec![ChatRequest {
                object_id: oid.id.clone(),
                object_serial: oid.serial.clone(),
                text: text.to_string(),
            }],
            ..Default::default()
        });
        result
    }

    pub fn start_dialog(
        &self,
        module: &mut Module,
        owner: &ObjectId,
        talker: &ObjectId,
        dialog_id: &str,
    ) -> anyhow::Result<()> {
        let result = module.start_dialog(owner, talker, dialog_id);
        self.send(Request {
            dialog: vec![DialogRequest {
                owner_id: owner.id.clone(),
                owner_serial: owner.serial.clone(),
                talker_id: talker.id.clone(),
                talker_serial: talker.serial.clone(),
                dialog_id: dialog_id.to_string(),
            }],
            ..Default::default()
        });
        result
    }

    pub fn answer_dialog(
        &self,
        module: &mut Module,
        owner: &ObjectId,
        talker: &ObjectId,
        answer_id: &str,
    ) -> anyhow::Result<()> {
        let result = module.answer_dialog(owner, talker, answer_id);
        self.send(Request {
            dialog_answer: vec![DialogAnswerRequest {
                owner_id: owner.id.clone(),
                owner_serial: owner.serial.clone(),
                talker_id: talker.id.clone(),
                talker_serial: talker.serial.clone(),
                answer_id: answer_id.to_string(),
            }],
            ..Default::default()
        });
        result
    }

    pub fn end_dialog(
        &self,
        module: &mut Module,
        owner: &ObjectId,
        talker: &ObjectId,
    ) -> anyhow::Result<()> {
        let result = module.end_dialog(owner, talker);
        self.send(Request {
            dialog_end: vec![DialogEndRequest {
                owner_id: owner.id.clone(),
                owner_serial: owner.serial.clone(),
                talker_id: talker.id.clone(),
                talker_serial: talker.serial.clone(),
            }],
            ..Default::default()
        });
        result
    }

    /// Spawns a character from a template. Local only; a server spawns
    /// through its own console.
    pub fn spawn_char(
        &self,
        module: &mut Module,
        template: &str,
        area: &str,
        pos: Position,
    ) -> anyhow::Result<ObjectId> {
        if self.has_server() {
            bail!("Spawning is done by the server");
        }
        module.spawn_char(template, area, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::server::NetworkCommand;
    use super::*;
    use crate::testing::{merchant, pc, test_module, wolf};
    use mural_core::protocol::{CharacterResponse, UpdateResponse, UseResponse};
    use mural_core::types::Character;

    fn local_game() -> Game {
        let game = Game::new(mural_core::share(test_module()), Console::new());
        game.add_player_char(pc());
        game
    }

    fn attached_game() -> (Game, mpsc::Receiver<NetworkCommand>) {
        let game = local_game();
        let (tx, rx) = mpsc::channel();
        game.set_server(Some(ServerLink::new(tx)));
        (game, rx)
    }

    fn sent(rx: &mpsc::Receiver<NetworkCommand>) -> Vec<Request> {
        rx.try_iter()
            .filter_map(|c| match c {
                NetworkCommand::Send(r) => Some(r),
                NetworkCommand::Shutdown => None,
            })
            .collect()
    }

    #[test]
    fn move_without_server_sends_nothing() {
        let game = local_game();
        let mut module = test_module();
        game.move_to(&mut module, &pc(), Position::new(100.0, 100.0));
        assert_eq!(module.char(&pc()).unwrap().dest, Some(Position::new(100.0, 100.0)));
        assert!(!game.has_server());
    }

    #[test]
    fn every_intent_is_forwarded_after_local_mutation() {
        let (game, rx) = attached_game();
        let mut module = test_module();
        game.move_to(&mut module, &pc(), Position::new(70.0, 60.0));
        game.set_target(&mut module, &pc(), Some(wolf()));
        game.chat(&mut module, &pc(), "hi").unwrap();
        game.unequip(&mut module, &pc(), "sword1").unwrap();
        game.equip(&mut module, &pc(), "sword1").unwrap();

        let requests = sent(&rx);
        assert_eq!(requests.len(), 5);
        assert_eq!(requests[0].move_[0].pos_x, 70.0);
        assert_eq!(requests[1].target[0].target_id, "wolf");
        assert_eq!(requests[2].chat[0].text, "hi");
        assert_eq!(requests[3].unequip[0].item_serial, "1");
        assert_eq!(requests[4].equip[0].item_id, "sword");
        assert_eq!(module.char(&pc()).unwrap().targets, vec![wolf()]);
    }

    #[test]
    fn item_and_training_intents_are_forwarded() {
        let (game, rx) = attached_game();
        let mut module = test_module();
        module.char_mut(&merchant()).unwrap().position = Position::new(60.0, 60.0);

        let _ = game.throw_items(&mut module, &pc(), &["apple2".to_string()]);
        let _ = game.transfer_items(&mut module, &merchant(), &pc(), &["gem3".to_string()]);
        let _ = game.trade(&mut module, &merchant(), &pc(), &[], &["sword1".to_string()]);
        let training = UseAction::Training {
            trainer: merchant(),
            training: "haggle".into(),
        };
        let _ = game.use_action(&mut module, &pc(), training, UseTarget::Auto);

        let requests = sent(&rx);
        assert_eq!(requests.len(), 4);
        let throw = &requests[0].throw_items[0];
        assert_eq!(throw.object_id, "player");
        assert_eq!(throw.items, vec![ObjectId::new("apple", "2")]);
        let transfer = &requests[1].transfer_items[0];
        assert_eq!(transfer.object_from_id, "merchant");
        assert_eq!(transfer.object_to_id, "player");
        assert_eq!(transfer.items, vec![ObjectId::new("gem", "3")]);
        let trade = &requests[2].trade[0];
        assert_eq!((trade.seller_id.as_str(), trade.buyer_id.as_str()), ("merchant", "player"));
        assert!(trade.items_buy.is_empty());
        assert_eq!(trade.items_sell, vec![ObjectId::new("sword", "1")]);
        let train = &requests[3].training[0];
        assert_eq!(train.trainer_id, "merchant");
        assert_eq!(train.trainee_serial, "0");
        assert_eq!(train.training_id, "haggle");
    }

    #[test]
    fn only_player_characters_become_active() {
        let game = local_game();
        assert!(!game.set_active_player_char(wolf()));
        assert!(!game.next_player_char());
        assert_eq!(game.active_player_char(), Some(pc()));

        game.add_player_char(merchant());
        assert!(game.next_player_char());
        assert_eq!(game.active_player_char(), Some(merchant()));
        assert!(game.is_player_char(&merchant()));
        assert!(game.next_player_char());
        assert_eq!(game.active_player_char(), Some(pc()));
    }

    #[test]
    fn spawning_is_local_only() {
        let game = local_game();
        let mut module = test_module();
        module.char_templates.push(Character::new("bandit", "", "Bandit"));
        let oid = game
            .spawn_char(&mut module, "bandit", "village", Position::new(10.0, 10.0))
            .unwrap();
        assert_eq!(module.char(&oid).unwrap().position, Position::new(10.0, 10.0));

        let (attached, _rx) = attached_game();
        assert!(attached
            .spawn_char(&mut module, "bandit", "village", Position::default())
            .is_err());
    }

    #[test]
    fn attack_in_range_sends_use_and_waits_for_confirmation() {
        let (game, rx) = attached_game();
        let mut module = test_module();
        let result = game.use_action(&mut module, &pc(), UseAction::Hit, UseTarget::Char(wolf()));
        assert!(result.is_ok());
        assert_eq!(module.char(&wolf()).unwrap().health, 5);

        let requests = sent(&rx);
        let use_req = &requests[0].use_[0];
        assert_eq!((use_req.user_id.as_str(), use_req.user_serial.as_str()), ("player", "0"));
        assert_eq!(use_req.object_id, "wolf");
        assert!(game.drain_events().is_empty());

        game.handle_response(Response {
            use_: vec![UseResponse {
                user_id: "player".into(),
                user_serial: "0".into(),
                object_id: "wolf".into(),
                object_serial: "5".into(),
            }],
            ..Default::default()
        });
        assert_eq!(
            game.drain_events(),
            vec![GameEvent::Used {
                user: pc(),
                object: "wolf".into()
            }]
        );
    }

    #[test]
    fn local_use_fires_at_once() {
        let game = local_game();
        let mut module = test_module();
        game.use_action(&mut module, &pc(), UseAction::Hit, UseTarget::Char(wolf()))
            .unwrap();
        assert_eq!(game.drain_events().len(), 1);
    }

    #[test]
    fn out_of_range_use_walks_closer() {
        let game = local_game();
        let mut module = test_module();
        module.char_mut(&wolf()).unwrap().position = Position::new(250.0, 50.0);
        let err = game
            .use_action(&mut module, &pc(), UseAction::Hit, UseTarget::Char(wolf()))
            .unwrap_err();
        assert_eq!(err.text_id(), "tar_too_far");
        let player = module.char(&pc()).unwrap();
        assert_eq!(player.private_log.last().unwrap().text, "tar_too_far");
        assert_eq!(player.dest, Some(Position::new(200.0, 50.0)));
    }

    #[test]
    fn approach_reports_and_moves() {
        let game = local_game();
        let mut module = test_module();
        game.approach(&mut module, &pc(), Position::new(250.0, 50.0));
        let player = module.char(&pc()).unwrap();
        assert_eq!(player.private_log.last().unwrap().text, "tar_too_far");
        assert_eq!(player.dest, Some(Position::new(200.0, 50.0)));
    }

    #[test]
    fn pause_over_network_waits_for_update() {
        let (game, rx) = attached_game();
        game.pause();
        assert!(!game.paused());
        assert_eq!(sent(&rx)[0].pause, Some(true));

        game.handle_response(Response {
            update: Some(Box::new(UpdateResponse {
                module: test_module(),
                paused: true,
            })),
            ..Default::default()
        });
        assert!(game.paused());

        let local = local_game();
        local.pause();
        assert!(local.paused());
    }

    #[test]
    fn player_chars_are_added_once() {
        let game = Game::new(mural_core::share(test_module()), Console::new());
        let response = Response {
            character: vec![
                CharacterResponse {
                    id: "player".into(),
                    serial: "0".into(),
                },
                CharacterResponse {
                    id: "player".into(),
                    serial: "0".into(),
                },
            ],
            ..Default::default()
        };
        game.handle_response(response);
        assert_eq!(game.player_chars(), vec![pc()]);
        assert_eq!(game.active_player_char(), Some(pc()));
        assert_eq!(game.drain_events(), vec![GameEvent::PlayerAdded(pc())]);
    }

    #[test]
    fn visibility_uses_sight_range() {
        let game = local_game();
        let module = test_module();
        let range = module.char(&pc()).unwrap().sight_range;
        assert!(game.visible_for_player(&module, 50.0 + range, 50.0));
        assert!(!game.visible_for_player(&module, 50.0 + range + 1.0, 50.0));
    }

    #[test]
    fn dialog_intents_reach_the_server() {
        let (game, rx) = attached_game();
        let mut module = test_module();
        module.char_mut(&merchant()).unwrap().position = Position::new(60.0, 60.0);
        game.start_dialog(&mut module, &merchant(), &pc(), "merchant").unwrap();
        game.answer_dialog(&mut module, &merchant(), &pc(), "buy").unwrap();
        game.end_dialog(&mut module, &merchant(), &pc()).unwrap();
        let requests = sent(&rx);
        assert_eq!(requests[0].dialog[0].dialog_id, "merchant");
        assert_eq!(requests[1].dialog_answer[0].answer_id, "buy");
        assert_eq!(requests[2].dialog_end[0].talker_id, "player");
    }
}
