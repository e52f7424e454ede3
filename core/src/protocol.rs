//! Server wire records.
//!
//! Every message is one line of UTF-8 JSON. A request or response is an
//! object whose keys name variants; each key carries an array of payloads
//! (or a scalar for `pause`, `save`, `load` and `close`). Keys a reader does
//! not know are ignored.

use serde::{Deserialize, Serialize};

use crate::types::{Module, ObjectId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NewCharRequest {
    /// Character template to create the player character from.
    pub template: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MoveRequest {
    pub id: String,
    pub serial: String,
    pub pos_x: f64,
    pub pos_y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetRequest {
    pub id: String,
    pub serial: String,
    pub target_id: String,
    pub target_serial: String,
}

/// Use of `object` by `user`. The object is a skill, recipe, item, training
/// or (for attacks) the target character; `target` is optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UseRequest {
    pub user_id: String,
    pub user_serial: String,
    pub object_id: String,
    #[serde(default)]
    pub object_serial: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_serial: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EquipRequest {
    pub char_id: String,
    pub char_serial: String,
    pub item_id: String,
    pub item_serial: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ThrowItemsRequest {
    pub object_id: String,
    pub object_serial: String,
    pub items: Vec<ObjectId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransferItemsRequest {
    pub object_from_id: String,
    pub object_from_serial: String,
    pub object_to_id: String,
    pub object_to_serial: String,
    pub items: Vec<ObjectId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TradeRequest {
    pub seller_id: String,
    pub seller_serial: String,
    pub buyer_id: String,
    pub buyer_serial: String,
    pub items_buy: Vec<ObjectId>,
    pub items_sell: Vec<ObjectId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DialogRequest {
    pub owner_id: String,
    pub owner_serial: String,
    pub talker_id: String,
    pub talker_serial: String,
    pub dialog_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DialogEndRequest {
    pub owner_id: String,
    pub owner_serial: String,
    pub talker_id: String,
    pub talker_serial: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DialogAnswerRequest {
    pub owner_id: String,
    pub owner_serial: String,
    pub talker_id: String,
    pub talker_serial: String,
    pub answer_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TrainingRequest {
    pub trainer_id: String,
    pub trainer_serial: String,
    pub trainee_id: String,
    pub trainee_serial: String,
    pub training_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChatRequest {
    pub object_id: String,
    pub object_serial: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandRequest {
    pub command: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Request {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub login: Vec<LoginRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub new_char: Vec<NewCharRequest>,
    #[serde(rename = "move", skip_serializing_if = "Vec::is_empty")]
    pub move_: Vec<MoveRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub set_pos: Vec<MoveRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target: Vec<TargetRequest>,
    #[serde(rename = "use", skip_serializing_if = "Vec::is_empty")]
    pub use_: Vec<UseRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub equip: Vec<EquipRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unequip: Vec<EquipRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub throw_items: Vec<ThrowItemsRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transfer_items: Vec<TransferItemsRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trade: Vec<TradeRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dialog: Vec<DialogRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dialog_end: Vec<DialogEndRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dialog_answer: Vec<DialogAnswerRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub training: Vec<TrainingRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chat: Vec<ChatRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<CommandRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<String>,
    /// Exit code the server should close with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<i64>,
}

impl Request {
    pub fn is_empty(&self) -> bool {
        *self == Request::default()
    }

    /// Encodes the request as one newline terminated line.
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn from_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim_end())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateResponse {
    pub module: Module,
    #[serde(default)]
    pub paused: bool,
}

/// A player character was created for this client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CharacterResponse {
    pub id: String,
    pub serial: String,
}

/// The server resolved a use request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UseResponse {
    pub user_id: String,
    pub user_serial: String,
    pub object_id: String,
    #[serde(default)]
    pub object_serial: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandResponse {
    pub result: i32,
    #[serde(default)]
    pub out: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Box<UpdateResponse>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub character: Vec<CharacterResponse>,
    #[serde(rename = "use", skip_serializing_if = "Vec::is_empty")]
    pub use_: Vec<UseResponse>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<CommandResponse>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub error: Vec<String>,
}

impl Response {
    pub fn is_empty(&self) -> bool {
        *self == Response::default()
    }

    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn from_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_variant_keys() {
        let req = Request {
            use_: vec![UseRequest {
                user_id: "player".into(),
                user_serial: "0".into(),
                object_id: "wolf".into(),
                object_serial: "5".into(),
                target_id: String::new(),
                target_serial: String::new(),
            }],
            pause: Some(true),
            ..Default::default()
        };
        let line = req.to_line().unwrap();
        assert!(line.ends_with('\n'));
        assert!(line.starts_with(r#"{"use":[{"user-id":"player""#));
        assert!(line.contains(r#""pause":true"#));
        assert!(!line.contains("target-id"));
        assert_eq!(Request::from_line(&line).unwrap(), req);
    }

    #[test]
    fn response_ignores_unknown_variants() {
        let resp = Response::from_line(r#"{"weather":[{"rain":true}],"error":["boom"]}"#).unwrap();
        assert_eq!(resp.error, vec!["boom"]);
        assert!(resp.update.is_none());

        let only_unknown = Response::from_line(r#"{"weather":[]}"#).unwrap();
        assert!(only_unknown.is_empty());
    }

    #[test]
    fn command_response_defaults_output() {
        let resp = Response::from_line(r#"{"command":[{"result":0}]}"#).unwrap();
        assert_eq!(
            resp.command,
            vec![CommandResponse {
                result: 0,
                out: String::new()
            }]
        );
    }
}
