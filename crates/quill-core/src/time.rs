//! Temporal binding and delay states
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which state of the event a node's values represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Time {
    Past = -1,
    Default = 0,
    Future = 1,
}

impl Time {
    pub fn as_i8(self) -> i8 {
        self as i8
    }

    pub fn from_i8(raw: i8) -> Option<Self> {
        match raw {
            -1 => Some(Time::Past),
            0 => Some(Time::Default),
            1 => Some(Time::Future),
            _ => None,
        }
    }
}

impl Default for Time {
    fn default() -> Self {
        Time::Default
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Time::Past => write!(f, "past"),
            Time::Default => write!(f, "present"),
            Time::Future => write!(f, "future"),
        }
    }
}

/// Three-valued truth, used for "is there a delay before this element".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Kleenean {
    #[default]
    False,
    Unknown,
    True,
}

impl Kleenean {
    pub fn is_true(self) -> bool {
        self == Kleenean::True
    }

    pub fn is_false(self) -> bool {
        self == Kleenean::False
    }

    /// Combine two branches that may both have run (e.g. the arms of an if).
    pub fn or(self, other: Kleenean) -> Kleenean {
        match (self, other) {
            (Kleenean::True, _) | (_, Kleenean::True) => Kleenean::True,
            (Kleenean::False, Kleenean::False) => Kleenean::False,
            _ => Kleenean::Unknown,
        }
    }

    /// Combine two branches where only one ran.
    pub fn either(self, other: Kleenean) -> Kleenean {
        if self == other {
            self
        } else {
            Kleenean::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_roundtrip_through_i8() {
        for t in [Time::Past, Time::Default, Time::Future] {
            assert_eq!(Time::from_i8(t.as_i8()), Some(t));
        }
        assert_eq!(Time::from_i8(2), None);
    }

    #[test]
    fn test_kleenean_combinators() {
        assert_eq!(Kleenean::False.or(Kleenean::True), Kleenean::True);
        assert_eq!(Kleenean::False.or(Kleenean::Unknown), Kleenean::Unknown);
        assert_eq!(Kleenean::True.either(Kleenean::False), Kleenean::Unknown);
        assert_eq!(Kleenean::True.either(Kleenean::True), Kleenean::True);
    }
}
