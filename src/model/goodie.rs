//! Goodies: wearable accessories.

use serde::{Deserialize, Serialize};

/// An accessory the pet owns.
///
/// `kind` picks the render slot (1-based); `id` picks the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goodie {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: u32,
}

/// Goodies a freshly installed app starts with.
pub fn starter_goodies() -> Vec<Goodie> {
    vec![
        Goodie { id: 1, kind: 1 },
        Goodie { id: 23, kind: 2 },
        Goodie { id: 31, kind: 3 },
    ]
}

/// Which starter goodies are worn by default, parallel to [`starter_goodies`].
pub fn starter_equipped() -> Vec<bool> {
    vec![false, true, false]
}

/// Pairs owned goodies with their equipped flags and returns the worn ones.
///
/// Flags beyond the owned list are ignored; missing flags count as not worn.
pub fn worn<'a>(owned: &'a [Goodie], equipped: &'a [bool]) -> impl Iterator<Item = Goodie> + 'a {
    owned
        .iter()
        .zip(equipped)
        .filter(|(_, on)| **on)
        .map(|(g, _)| *g)
}
