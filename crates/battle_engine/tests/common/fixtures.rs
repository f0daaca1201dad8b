//! Fixture data structures for damage calculation tests.
//!
//! These types are deserialized from `tests/fixtures/damage.json`.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use battle_engine::entities::BaseStats;
use battle_engine::types::Type;
use serde::Deserialize;

/// Root structure for the damage fixture file.
#[derive(Deserialize)]
pub struct DamageFixture {
    #[allow(dead_code)]
    pub meta: Option<serde_json::Value>,
    pub cases: Vec<DamageTestCase>,
}

/// A single damage calculation test case.
#[derive(Deserialize, Debug, Clone)]
pub struct DamageTestCase {
    pub id: String,
    pub attacker: CreatureData,
    pub defender: CreatureData,
    #[serde(rename = "move")]
    pub move_data: MoveData,
    #[serde(default)]
    pub crit: bool,
    #[serde(default = "full_spread")]
    pub spread: f64,
    pub expected: ExpectedResult,
}

fn full_spread() -> f64 {
    1.0
}

/// Creature configuration from fixture.
#[derive(Deserialize, Debug, Clone)]
pub struct CreatureData {
    pub name: String,
    pub level: u8,
    pub types: Vec<Type>,
    pub stats: BaseStats,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MoveData {
    pub name: String,
    #[serde(rename = "type")]
    pub move_type: Type,
    #[serde(default)]
    pub power: u16,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ExpectedResult {
    pub damage: u16,
    pub effectiveness: f64,
}

/// Path of the damage fixture file.
pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("damage.json")
}

/// Load every damage case.
pub fn load_damage_cases() -> Vec<DamageTestCase> {
    let file = File::open(fixture_path()).expect("damage fixture file");
    let fixture: DamageFixture =
        serde_json::from_reader(BufReader::new(file)).expect("parse damage fixture");
    fixture.cases
}
