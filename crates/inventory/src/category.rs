use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockroom_core::DomainError;

/// Fixed set of component categories.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Microcontroller,
    Sensor,
    Module,
    Passive,
    Semiconductor,
    Power,
    Connector,
    Cable,
    Tool,
    Mechanical,
    Other,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Microcontroller,
        Category::Sensor,
        Category::Module,
        Category::Passive,
        Category::Semiconductor,
        Category::Power,
        Category::Connector,
        Category::Cable,
        Category::Tool,
        Category::Mechanical,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Microcontroller => "Microcontroller",
            Category::Sensor => "Sensor",
            Category::Module => "Module",
            Category::Passive => "Passive",
            Category::Semiconductor => "Semiconductor",
            Category::Power => "Power",
            Category::Connector => "Connector",
            Category::Cable => "Cable",
            Category::Tool => "Tool",
            Category::Mechanical => "Mechanical",
            Category::Other => "Other",
        }
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::validation(format!("invalid category '{wanted}'")))
    }
}
