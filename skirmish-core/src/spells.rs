//! Spell definitions and the shared spell catalog

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Spell identifier (index into a `SpellBook`)
pub type SpellId = usize;

/// What a spell does to its target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Damage,
    Heal,
}

/// Spell definition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,
    /// Action points consumed per cast
    pub cost: u32,
    /// Inclusive Manhattan range band
    pub min_range: i32,
    pub max_range: i32,
    pub needs_los: bool,
    pub effect: EffectKind,
    pub magnitude: u32,
}

impl Spell {
    pub fn new(
        name: &str,
        cost: u32,
        min_range: i32,
        max_range: i32,
        needs_los: bool,
        effect: EffectKind,
        magnitude: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            cost,
            min_range,
            max_range,
            needs_los,
            effect,
            magnitude,
        }
    }
}

/// Name of the basic melee spell every side starts with
pub const STRIKE: &str = "Strike";
pub const ARROW: &str = "Arrow";
pub const HEAL: &str = "Heal";

/// Read-only spell catalog. Built once and shared by reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpellBook {
    spells: Vec<Spell>,
}

impl Default for SpellBook {
    fn default() -> Self {
        Self::standard()
    }
}

impl SpellBook {
    /// The stock catalog
    pub fn standard() -> Self {
        Self {
            spells: vec![
                Spell::new(STRIKE, 3, 1, 3, true, EffectKind::Damage, 20),
                Spell::new(ARROW, 4, 2, 5, true, EffectKind::Damage, 15),
                Spell::new(HEAL, 2, 1, 3, true, EffectKind::Heal, 15),
            ],
        }
    }

    /// Build a catalog, rejecting duplicate names and inverted range bands
    pub fn from_spells(spells: Vec<Spell>) -> Result<Self, ConfigError> {
        for (i, spell) in spells.iter().enumerate() {
            if spell.min_range < 0 || spell.min_range > spell.max_range {
                return Err(ConfigError::Invalid(format!(
                    "spell {} has range {}..={}",
                    spell.name, spell.min_range, spell.max_range
                )));
            }
            if spells[..i].iter().any(|s| s.name == spell.name) {
                return Err(ConfigError::Invalid(format!("duplicate spell {}", spell.name)));
            }
        }
        Ok(Self { spells })
    }

    /// Parse a JSON array of spells
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let spells: Vec<Spell> = serde_json::from_str(json)?;
        Self::from_spells(spells)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(&self.spells)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, id: SpellId) -> Option<&Spell> {
        self.spells.get(id)
    }

    /// Get spell index from its name
    pub fn id_of(&self, name: &str) -> Option<SpellId> {
        self.spells.iter().position(|s| s.name == name)
    }

    pub fn by_name(&self, name: &str) -> Option<&Spell> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    /// Resolve spell names to ids
    pub fn resolve(&self, names: &[String]) -> Result<Vec<SpellId>, ConfigError> {
        names
            .iter()
            .map(|name| self.id_of(name).ok_or_else(|| ConfigError::UnknownSpell(name.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.spells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpellId, &Spell)> {
        self.spells.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_lookup() {
        let book = SpellBook::standard();
        assert_eq!(book.len(), 3);
        assert_eq!(book.id_of(STRIKE), Some(0));
        assert_eq!(book.id_of("Fireball"), None);

        let heal = book.by_name(HEAL).unwrap();
        assert_eq!(heal.effect, EffectKind::Heal);
        assert_eq!(heal.cost, 2);

        let arrow = book.get(1).unwrap();
        assert_eq!((arrow.min_range, arrow.max_range), (2, 5));
        assert!(book.get(3).is_none());
    }

    #[test]
    fn test_resolve_names() {
        let book = SpellBook::standard();
        let ids = book.resolve(&[HEAL.to_string(), STRIKE.to_string()]).unwrap();
        assert_eq!(ids, vec![2, 0]);
        assert!(matches!(
            book.resolve(&["Nope".to_string()]),
            Err(ConfigError::UnknownSpell(name)) if name == "Nope"
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let book = SpellBook::standard();
        let json = serde_json::to_string(&book.spells).unwrap();
        assert_eq!(SpellBook::from_json(&json).unwrap(), book);
    }

    #[test]
    fn test_rejects_bad_catalog() {
        let inverted = vec![Spell::new("Bad", 1, 4, 2, false, EffectKind::Damage, 1)];
        assert!(SpellBook::from_spells(inverted).is_err());

        let dup = vec![
            Spell::new("Twin", 1, 1, 2, false, EffectKind::Damage, 1),
            Spell::new("Twin", 2, 1, 2, false, EffectKind::Heal, 1),
        ];
        assert!(SpellBook::from_spells(dup).is_err());
    }
}
