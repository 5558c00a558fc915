//! Compiled-in crab species table

use serde::Serialize;

/// A crab species the game can spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Species {
    /// Display name (shown as the image title)
    pub name: &'static str,
    /// The species the player is hunting
    pub is_target: bool,
    /// Carapace spine count, shown next to the name
    pub spines: u8,
    /// Image path relative to the page
    pub image_url: &'static str,
    /// Text shown when the image fails to load
    pub fallback_text: &'static str,
}

impl Species {
    /// Tooltip text, e.g. "Kelp Crab (3 Spines)"
    pub fn title(&self) -> String {
        format!("{} ({} Spines)", self.name, self.spines)
    }
}

/// The default catalog: one invasive target and three native decoys
pub static CATALOG: &[Species] = &[
    Species {
        name: "European Green Crab (EGC)",
        is_target: true,
        spines: 5,
        image_url: "./img/egC.png",
        fallback_text: "EGC",
    },
    Species {
        name: "Dungeness Crab",
        is_target: false,
        spines: 9,
        image_url: "./img/dc.png",
        fallback_text: "Dungeness",
    },
    Species {
        name: "Red Rock Crab",
        is_target: false,
        spines: 9,
        image_url: "./img/rrc.png",
        fallback_text: "Red Rock",
    },
    Species {
        name: "Kelp Crab",
        is_target: false,
        spines: 3,
        image_url: "./img/kc.png",
        fallback_text: "Kelp Crab",
    },
];

/// First target species in a catalog
pub fn target_species(catalog: &'static [Species]) -> Option<&'static Species> {
    catalog.iter().find(|s| s.is_target)
}

/// All non-target species, in catalog order
pub fn decoy_species(catalog: &'static [Species]) -> Vec<&'static Species> {
    catalog.iter().filter(|s| !s.is_target).collect()
}
