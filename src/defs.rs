//! Immutable petal definition catalog
//!
//! Definitions are loaded once at startup (builtin table or JSON) and never
//! mutated afterwards. Simulation code refers to them by `PetalDefId`, an
//! index into the registry, so hot paths stay free of string lookups.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Definition rarity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Unusual,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

/// Owner stat multipliers granted while a definition is equipped
///
/// The identity element is all zeros with `speed = 1.0`; aggregation over
/// equipped slots sums the additive fields and multiplies `speed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Added to the owner's max health
    pub max_health: f32,
    /// Passive owner heal (health/s)
    pub heal_per_second: f32,
    /// Added to the ring's revolution step (radians/tick)
    pub revolution_speed: f32,
    /// Owner movement speed factor
    pub speed: f32,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            max_health: 0.0,
            heal_per_second: 0.0,
            revolution_speed: 0.0,
            speed: 1.0,
        }
    }
}

impl Modifiers {
    /// Fold another modifier set into this one
    pub fn combine(&mut self, other: &Modifiers) {
        self.max_health += other.max_health;
        self.heal_per_second += other.heal_per_second;
        self.revolution_speed += other.revolution_speed;
        self.speed *= other.speed;
    }
}

/// One immutable petal definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetalDefinition {
    /// Stable string id ("basic", "rose", ...)
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub rarity: Rarity,
    /// Damage dealt on contact (petals without it never hurt anything)
    #[serde(default)]
    pub damage: Option<f32>,
    /// Petal durability; absent means the petal cannot be damaged
    #[serde(default)]
    pub health: Option<f32>,
    /// Heal applied to the owner when the use effect completes
    #[serde(default)]
    pub heal: Option<f32>,
    /// Seconds to respawn after breaking (absent/zero = instant)
    #[serde(default)]
    pub reload_time: Option<f32>,
    /// Seconds the use effect takes to complete
    #[serde(default)]
    pub use_time: Option<f32>,
    pub hitbox_radius: f32,
    /// Duplicate definitions spawn `piece_amount` petals per slot
    #[serde(default)]
    pub is_duplicate: bool,
    #[serde(default = "default_piece_amount")]
    pub piece_amount: u32,
    #[serde(default)]
    pub modifiers: Modifiers,
}

fn default_piece_amount() -> u32 {
    1
}

impl PetalDefinition {
    /// Visual/angular pieces one petal of this definition contributes
    pub fn displayed_pieces(&self) -> u32 {
        if self.is_duplicate { self.piece_amount } else { 1 }
    }
}

/// Index of a definition inside its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PetalDefId(pub u16);

/// Catalog construction failure
#[derive(Debug)]
pub enum RegistryError {
    Parse(serde_json::Error),
    DuplicateId(String),
    BadPieceAmount(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Parse(e) => write!(f, "invalid definition JSON: {e}"),
            RegistryError::DuplicateId(id) => write!(f, "duplicate definition id '{id}'"),
            RegistryError::BadPieceAmount(id) => {
                write!(f, "definition '{id}' has piece_amount of zero")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<serde_json::Error> for RegistryError {
    fn from(e: serde_json::Error) -> Self {
        RegistryError::Parse(e)
    }
}

/// Id-indexed, immutable table of petal definitions
#[derive(Debug, Clone)]
pub struct PetalRegistry {
    defs: Vec<PetalDefinition>,
    by_id: HashMap<String, PetalDefId>,
}

impl PetalRegistry {
    /// Build a registry from a definition list (all-or-nothing)
    pub fn new(defs: Vec<PetalDefinition>) -> Result<Self, RegistryError> {
        let mut by_id = HashMap::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if def.piece_amount == 0 {
                return Err(RegistryError::BadPieceAmount(def.id.clone()));
            }
            if by_id.insert(def.id.clone(), PetalDefId(i as u16)).is_some() {
                return Err(RegistryError::DuplicateId(def.id.clone()));
            }
        }
        Ok(Self { defs, by_id })
    }

    /// Parse a registry from a JSON array of definitions
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let defs: Vec<PetalDefinition> = serde_json::from_str(json)?;
        Self::new(defs)
    }

    /// The default petal set
    pub fn builtin() -> Self {
        let defs = vec![
            PetalDefinition {
                id: "basic".into(),
                display_name: "Basic".into(),
                rarity: Rarity::Common,
                damage: Some(10.0),
                health: Some(10.0),
                heal: None,
                reload_time: Some(2.5),
                use_time: None,
                hitbox_radius: 0.6,
                is_duplicate: false,
                piece_amount: 1,
                modifiers: Modifiers::default(),
            },
            PetalDefinition {
                id: "light".into(),
                display_name: "Light".into(),
                rarity: Rarity::Unusual,
                damage: Some(6.0),
                health: Some(5.0),
                heal: None,
                reload_time: Some(0.5),
                use_time: None,
                hitbox_radius: 0.4,
                is_duplicate: false,
                piece_amount: 1,
                modifiers: Modifiers::default(),
            },
            PetalDefinition {
                id: "sand".into(),
                display_name: "Sand".into(),
                rarity: Rarity::Unusual,
                damage: Some(3.0),
                health: Some(2.0),
                heal: None,
                reload_time: Some(1.0),
                use_time: None,
                hitbox_radius: 0.35,
                is_duplicate: true,
                piece_amount: 4,
                modifiers: Modifiers::default(),
            },
            PetalDefinition {
                id: "rose".into(),
                display_name: "Rose".into(),
                rarity: Rarity::Rare,
                damage: None,
                health: Some(5.0),
                heal: Some(10.0),
                reload_time: Some(3.5),
                use_time: Some(1.5),
                hitbox_radius: 0.5,
                is_duplicate: false,
                piece_amount: 1,
                modifiers: Modifiers::default(),
            },
            PetalDefinition {
                id: "stinger".into(),
                display_name: "Stinger".into(),
                rarity: Rarity::Rare,
                damage: Some(35.0),
                health: Some(1.0),
                heal: None,
                reload_time: Some(4.0),
                use_time: None,
                hitbox_radius: 0.4,
                is_duplicate: false,
                piece_amount: 1,
                modifiers: Modifiers::default(),
            },
            PetalDefinition {
                id: "faster".into(),
                display_name: "Faster".into(),
                rarity: Rarity::Rare,
                damage: Some(5.0),
                health: Some(5.0),
                heal: None,
                reload_time: Some(1.0),
                use_time: None,
                hitbox_radius: 0.4,
                is_duplicate: false,
                piece_amount: 1,
                modifiers: Modifiers {
                    revolution_speed: 0.008,
                    ..Modifiers::default()
                },
            },
            PetalDefinition {
                id: "leaf".into(),
                display_name: "Leaf".into(),
                rarity: Rarity::Unusual,
                damage: Some(8.0),
                health: Some(10.0),
                heal: None,
                reload_time: Some(1.0),
                use_time: None,
                hitbox_radius: 0.5,
                is_duplicate: false,
                piece_amount: 1,
                modifiers: Modifiers {
                    heal_per_second: 1.0,
                    ..Modifiers::default()
                },
            },
        ];
        // Builtin table is known-good; new() only fails on authoring mistakes
        Self::new(defs).expect("builtin petal table is valid")
    }

    /// Look up a definition id by its string name
    pub fn get(&self, id: &str) -> Option<PetalDefId> {
        self.by_id.get(id).copied()
    }

    /// Resolve a definition (ids are only minted by this registry)
    pub fn def(&self, id: PetalDefId) -> &PetalDefinition {
        &self.defs[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Iterate definitions in id order
    pub fn iter(&self) -> impl Iterator<Item = (PetalDefId, &PetalDefinition)> {
        self.defs
            .iter()
            .enumerate()
            .map(|(i, d)| (PetalDefId(i as u16), d))
    }
}
