use serde::{Deserialize, Serialize};

use super::{Inventory, ObjectId, Position};

/// Static object placed in an area: a chest, a sign, a corpse pile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaObject {
    pub id: String,
    pub serial: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub inventory: Inventory,
}

impl AreaObject {
    pub fn object_id(&self) -> ObjectId {
        ObjectId::new(self.id.clone(), self.serial.clone())
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objects: Vec<AreaObject>,
}

impl Area {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            objects: Vec::new(),
        }
    }

    pub fn object(&self, oid: &ObjectId) -> Option<&AreaObject> {
        self.objects.iter().find(|o| oid.matches(&o.id, &o.serial))
    }

    pub fn object_mut(&mut self, oid: &ObjectId) -> Option<&mut AreaObject> {
        self.objects.iter_mut().find(|o| oid.matches(&o.id, &o.serial))
    }
}

/// A set of areas loaded together. Area resources live under
/// `chapters/<chapter>/areas/<area>/`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub areas: Vec<Area>,
    #[serde(default)]
    pub start_area: String,
    #[serde(default)]
    pub start_position: Position,
}

impl Chapter {
    pub fn area(&self, id: &str) -> Option<&Area> {
        self.areas.iter().find(|a| a.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_objects_by_identity() {
        let mut area = Area::new("forest");
        area.objects.push(AreaObject {
            id: "chest".into(),
            serial: "1".into(),
            name: String::new(),
            position: Position::new(3.0, 4.0),
            inventory: Inventory::default(),
        });
        let oid = ObjectId::new("chest", "1");
        assert_eq!(area.object(&oid).map(|o| o.display_name()), Some("chest"));
        assert!(area.object(&ObjectId::new("chest", "2")).is_none());
    }
}
