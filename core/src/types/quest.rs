use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestStage {
    pub id: String,
    pub info: String,
    /// Reaching this stage completes the quest.
    #[serde(default)]
    pub completes: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub stages: Vec<QuestStage>,
    #[serde(default)]
    pub active_stage: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl Quest {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    pub fn stage(&self) -> Option<&QuestStage> {
        let active = self.active_stage.as_deref()?;
        self.stages.iter().find(|s| s.id == active)
    }

    /// Starts the quest at its first stage if it has not started yet.
    pub fn start(&mut self) {
        if self.active_stage.is_none() {
            self.active_stage = self.stages.first().map(|s| s.id.clone());
            self.completed = self.stage().is_some_and(|s| s.completes);
        }
    }

    pub fn set_stage(&mut self, stage_id: &str) -> bool {
        let Some(stage) = self.stages.iter().find(|s| s.id == stage_id) else {
            return false;
        };
        self.completed = stage.completes;
        self.active_stage = Some(stage.id.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quest() -> Quest {
        Quest {
            id: "rats".into(),
            name: "Rats".into(),
            stages: vec![
                QuestStage {
                    id: "s1".into(),
                    info: "Kill rats".into(),
                    completes: false,
                },
                QuestStage {
                    id: "s2".into(),
                    info: "Done".into(),
                    completes: true,
                },
            ],
            active_stage: None,
            completed: false,
        }
    }

    #[test]
    fn set_stage_to_completing_stage_completes_quest() {
        let mut q = quest();
        q.start();
        assert_eq!(q.stage().map(|s| s.info.as_str()), Some("Kill rats"));
        assert!(!q.completed);
        assert!(q.set_stage("s2"));
        assert!(q.completed);
        assert!(!q.set_stage("missing"));
    }
}
