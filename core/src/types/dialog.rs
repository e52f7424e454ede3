//! Conversation trees owned by NPCs.

use serde::{Deserialize, Serialize};

use super::{Character, EffectTemplate, ObjectId, Quest, Requirements};

/// Answer target that finishes the conversation.
pub const END_STAGE: &str = "end";

/// Side effects of choosing an answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialogModifier {
    /// The owner starts trading with the talker.
    Trade,
    /// The owner offers its trainings to the talker.
    Train,
    StartQuest(Quest),
    QuestStage { quest: String, stage: String },
    AddFlag(String),
    RemoveFlag(String),
    Effect(EffectTemplate),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DialogAnswer {
    pub id: String,
    pub text: String,
    /// Stage the dialog moves to, or [`END_STAGE`].
    pub to: String,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub modifiers: Vec<DialogModifier>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DialogStage {
    pub id: String,
    pub text: String,
    /// Candidate entry point of the conversation.
    #[serde(default)]
    pub start: bool,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub answers: Vec<DialogAnswer>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dialog {
    pub id: String,
    #[serde(default)]
    pub requirements: Requirements,
    pub stages: Vec<DialogStage>,
    #[serde(default)]
    pub active_stage: Option<String>,
    #[serde(default)]
    pub target: Option<ObjectId>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub trading: bool,
    #[serde(default)]
    pub training: bool,
}

impl Dialog {
    pub fn available_for(&self, talker: &Character) -> bool {
        self.requirements.met_by(talker)
            && self
                .stages
                .iter()
                .any(|s| s.start && s.requirements.met_by(talker))
    }

    /// Resets the dialog and enters the first start stage `talker` meets.
    pub fn start(&mut self, talker: &Character) -> bool {
        self.restart();
        let stage = self
            .stages
            .iter()
            .find(|s| s.start && s.requirements.met_by(talker))
            .map(|s| s.id.clone());
        match stage {
            Some(stage) => {
                self.active_stage = Some(stage);
                self.target = Some(talker.object_id());
                true
            }
            None => false,
        }
    }

    pub fn restart(&mut self) {
        self.active_stage = None;
        self.target = None;
        self.finished = false;
        self.trading = false;
        self.training = false;
    }

    pub fn stage(&self) -> Option<&DialogStage> {
        let active = self.active_stage.as_deref()?;
        self.stages.iter().find(|s| s.id == active)
    }

    /// Answers of the current stage whose requirements `talker` meets.
    pub fn answers_for(&self, talker: &Character) -> Vec<&DialogAnswer> {
        self.stage()
            .map(|s| {
                s.answers
                    .iter()
                    .filter(|a| a.requirements.met_by(talker))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Applies the answer to the dialog state and returns the modifiers the
    /// module must apply to the talker. `None` if the answer is not offered.
    pub fn answer(&mut self, answer_id: &str, talker: &Character) -> Option<Vec<DialogModifier>> {
        let answer = self
            .answers_for(talker)
            .into_iter()
            .find(|a| a.id == answer_id)?
            .clone();

        for modifier in &answer.modifiers {
            match modifier {
                DialogModifier::Trade => self.trading = true,
                DialogModifier::Train => self.training = true,
                _ => {}
            }
        }

        if answer.to == END_STAGE || !self.stages.iter().any(|s| s.id == answer.to) {
            self.finished = true;
        } else {
            self.active_stage = Some(answer.to.clone());
        }
        Some(answer.modifiers)
    }
}
