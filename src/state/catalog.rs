/// Plant species offered by the selector modal
///
/// The `value` of each entry is appended to the prediction endpoint
/// as a path segment, so it must match the routes the server exposes.

/// A plant the server has a dedicated model for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Species {
    /// Title shown under the tile in the modal
    pub title: &'static str,
    /// URL path segment (e.g., "pepper_bell")
    pub value: &'static str,
}

impl Species {
    /// Human readable name built from the value ("pepper_bell" -> "Pepper Bell")
    pub fn display_name(&self) -> String {
        self.value
            .split('_')
            .filter(|word| !word.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// PlantVillage crops with at least one disease class
pub const CATALOG: [Species; 6] = [
    Species { title: "Apple", value: "apple" },
    Species { title: "Corn", value: "corn" },
    Species { title: "Grape", value: "grape" },
    Species { title: "Pepper", value: "pepper_bell" },
    Species { title: "Potato", value: "potato" },
    Species { title: "Tomato", value: "tomato" },
];

/// Look up a catalog entry by its path segment
pub fn find(value: &str) -> Option<Species> {
    CATALOG.iter().copied().find(|species| species.value == value)
}
