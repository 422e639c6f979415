use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifies a view document served by the view provider.
    ViewId
);
string_id!(
    /// Unique within a single view.
    LayerId
);
string_id!(
    /// Unique within a single view.
    VisualizationId
);
string_id!(
    /// Data source reference shared by layers and visualizations.
    SourceId
);

/// Monotonic stamp allocated on every view selection.
///
/// Every fetch and refresh tick carries the epoch that was current when it was
/// dispatched; completions from an older epoch are never applied.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Epoch(pub u64);

impl Epoch {
    pub fn next(self) -> Self {
        Epoch(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Epoch, LayerId};
    use std::collections::BTreeMap;

    #[test]
    fn ids_deserialize_from_plain_strings() {
        let id: LayerId = serde_json::from_str("\"traffic\"").unwrap();
        assert_eq!(id.as_str(), "traffic");
        assert_eq!(id.to_string(), "traffic");
    }

    #[test]
    fn ids_can_be_looked_up_by_str() {
        let mut m = BTreeMap::new();
        m.insert(LayerId::from("a"), 1);
        assert_eq!(m.get("a"), Some(&1));
    }

    #[test]
    fn epochs_are_monotonic() {
        let e = Epoch::default();
        assert!(e.next() > e);
        assert_eq!(e.next().next(), Epoch(2));
    }
}
