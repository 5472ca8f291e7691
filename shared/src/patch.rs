use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One field of a partial update: either left alone or replaced.
///
/// Nullable attributes use `Patch<Option<T>>`, so `Set(None)` clears the value
/// while `Unchanged` keeps it. On the wire a missing key is `Unchanged` and an
/// explicit `null` is `Set(None)`; pair fields with
/// `#[serde(default, skip_serializing_if = "Patch::is_unchanged")]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Unchanged,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Patch::Unchanged)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            Patch::Unchanged => None,
        }
    }

    /// Writes the value into `target` when set.
    pub fn apply_to(self, target: &mut T) {
        if let Patch::Set(value) = self {
            *target = value;
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unchanged
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Set(value)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Set(value) => value.serialize(serializer),
            Patch::Unchanged => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Patch::Set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Probe {
        #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
        note: Patch<Option<String>>,
    }

    #[test]
    fn missing_key_is_unchanged_and_null_clears() {
        let missing: Probe = serde_json::from_str("{}").unwrap();
        assert!(missing.note.is_unchanged());

        let cleared: Probe = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert_eq!(cleared.note, Patch::Set(None));

        let set: Probe = serde_json::from_str(r#"{"note": "hi"}"#).unwrap();
        assert_eq!(set.note, Patch::Set(Some("hi".to_string())));
    }

    #[test]
    fn unchanged_fields_are_not_written() {
        assert_eq!(serde_json::to_string(&Probe::default()).unwrap(), "{}");
        let probe = Probe { note: Patch::Set(None) };
        assert_eq!(serde_json::to_string(&probe).unwrap(), r#"{"note":null}"#);
    }

    #[test]
    fn apply_to_only_writes_set_values() {
        let mut value = 3;
        Patch::Unchanged.apply_to(&mut value);
        assert_eq!(value, 3);
        Patch::Set(7).apply_to(&mut value);
        assert_eq!(value, 7);
    }
}
