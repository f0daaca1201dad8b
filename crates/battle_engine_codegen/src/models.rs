//! JSON deserialization structures for the data files.

use serde::Deserialize;
use std::collections::HashMap;

/// One defending type's row: attacking type name -> damage code.
///
/// Codes: 0 = neutral, 1 = weak (2x), 2 = resists (0.5x), 3 = immune.
#[derive(Deserialize)]
pub struct TypeChartEntry {
    #[serde(rename = "damageTaken")]
    pub damage_taken: HashMap<String, u8>,
}
