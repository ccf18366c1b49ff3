//! Care actions: the one enumeration shared by the buffer, the wire, and the animator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A discrete pet-care interaction.
///
/// Serialized as the lowercase tag the remote service expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Fill the bowl.
    Feed,

    /// Tap the pet directly.
    Pet,

    /// Throw a toy.
    Toy,

    /// Hand over a treat.
    Treat,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [Self::Feed, Self::Pet, Self::Toy, Self::Treat];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Pet => "pet",
            Self::Toy => "toy",
            Self::Treat => "treat",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown action: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_lowercase_tag() {
        let json = serde_json::to_string(&[ActionKind::Feed, ActionKind::Toy]).unwrap();
        assert_eq!(json, r#"["feed","toy"]"#);
    }

    #[test]
    fn parses_known_tags_only() {
        assert_eq!("treat".parse::<ActionKind>().unwrap(), ActionKind::Treat);
        assert!("groom".parse::<ActionKind>().is_err());
    }
}
