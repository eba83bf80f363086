use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;

/// Doctor recommendation as returned by the backend. Read-only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    #[serde(default)]
    pub id: Option<Identifier>,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "specialty")]
    pub specialization: Option<String>,
    #[serde(default)]
    pub hospital: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub experience: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub match_score: Option<f64>,
    #[serde(default)]
    pub availability: Option<String>,
}

impl Doctor {
    /// "Dr. Meera Nair" -> "DMN"
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .collect()
    }

    /// Hospital and area joined for display, if either is known.
    pub fn location(&self) -> Option<String> {
        match (self.hospital.as_deref(), self.area.as_deref()) {
            (Some(hospital), Some(area)) => Some(format!("{}, {}", hospital, area)),
            (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
            (None, None) => None,
        }
    }
}
