//! Fixtures shared by the client's unit tests.

use mural_core::constants::ACTION_RANGE;
use mural_core::traits::Attitude;
use mural_core::types::{
    Area, Chapter, Character, Dialog, DialogAnswer, DialogModifier, DialogStage, EquipSlot, Item,
    ItemKind, MiscData, Module, ObjectId, Position, Requirements, Skill, SkillAnimation, END_STAGE,
    WeaponData, WeaponKind,
};

pub fn pc() -> ObjectId {
    ObjectId::new("player", "0")
}

pub fn wolf() -> ObjectId {
    ObjectId::new("wolf", "5")
}

pub fn merchant() -> ObjectId {
    ObjectId::new("merchant", "9")
}

pub fn sword(serial: &str) -> Item {
    Item {
        id: "sword".into(),
        serial: serial.into(),
        name: "Sword".into(),
        value: 30,
        level: 1,
        kind: ItemKind::Weapon(WeaponData {
            damage: (10, 10),
            range: ACTION_RANGE,
            kind: WeaponKind::Melee,
            slots: vec![EquipSlot::MainHand],
        }),
    }
}

pub fn misc(id: &str, serial: &str, value: i32) -> Item {
    Item {
        id: id.into(),
        serial: serial.into(),
        name: id.into(),
        value,
        level: 0,
        kind: ItemKind::Misc(MiscData::default()),
    }
}

pub fn skill(id: &str) -> Skill {
    Skill {
        id: id.into(),
        name: id.into(),
        cast_ms: 0,
        cooldown_ms: 0,
        range: ACTION_RANGE,
        mana_cost: 0,
        effects: Vec::new(),
        requirements: Requirements::default(),
        animation: SkillAnimation::Cast,
        needs_target: false,
    }
}

fn merchant_dialog() -> Dialog {
    let answer = |id: &str, to: &str, modifiers: Vec<DialogModifier>| DialogAnswer {
        id: id.into(),
        text: id.into(),
        to: to.into(),
        requirements: Requirements::default(),
        modifiers,
    };
    Dialog {
        id: "merchant".into(),
        requirements: Requirements::default(),
        stages: vec![
            DialogStage {
                id: "greet".into(),
                text: "Welcome!".into(),
                start: true,
                requirements: Requirements::default(),
                answers: vec![
                    answer("buy", "trade", vec![DialogModifier::Trade]),
                    answer("bye", END_STAGE, vec![]),
                ],
            },
            DialogStage {
                id: "trade".into(),
                text: "Take a look.".into(),
                start: false,
                requirements: Requirements::default(),
                answers: vec![],
            },
        ],
        active_stage: None,
        target: None,
        finished: false,
        trading: false,
        training: false,
    }
}

/// Village with the player at (50, 50) holding an equipped sword, a hostile
/// wolf 40 units to the east and a merchant far to the north.
pub fn test_module() -> Module {
    let chapter = Chapter {
        id: "prologue".into(),
        name: "Prologue".into(),
        areas: vec![Area::new("village"), Area::new("forest")],
        start_area: "village".into(),
        start_position: Position::new(50.0, 50.0),
    };
    let mut module = Module::new("test", chapter);

    let mut hero = Character::new("player", "0", "Hero");
    hero.area = "village".into();
    hero.position = Position::new(50.0, 50.0);
    hero.inventory.add_item(sword("1")).unwrap();
    hero.inventory.add_item(misc("apple", "2", 5)).unwrap();
    hero.equipment.equip(&sword("1"));
    module.characters.push(hero);

    let mut beast = Character::new("wolf", "5", "Wolf");
    beast.area = "village".into();
    beast.position = Position::new(90.0, 50.0);
    beast.health = 15;
    beast.max_health = 15;
    beast.default_attitude = Attitude::Hostile;
    module.characters.push(beast);

    let mut trader = Character::new("merchant", "9", "Merchant");
    trader.area = "village".into();
    trader.position = Position::new(50.0, 200.0);
    trader.inventory.add_item(misc("gem", "3", 50)).unwrap();
    trader.inventory.set_trade_price("gem3", 50);
    trader.dialogs.push(merchant_dialog());
    module.characters.push(trader);
    module
}
