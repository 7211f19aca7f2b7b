use serde::{Deserialize, Serialize};

/// Fixed set of seven generic tag slots carried by a document and copied
/// onto every chunk it produces. Slots are addressed by named fields only;
/// column names are never built from strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagSlots {
    pub tag1: Option<String>,
    pub tag2: Option<String>,
    pub tag3: Option<String>,
    pub tag4: Option<String>,
    pub tag5: Option<String>,
    pub tag6: Option<String>,
    pub tag7: Option<String>,
}

impl TagSlots {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "Tag payload must be a JSON object".to_string())?;

        let slot = |name: &str| -> Option<String> {
            object
                .get(name)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        Ok(Self {
            tag1: slot("tag1"),
            tag2: slot("tag2"),
            tag3: slot("tag3"),
            tag4: slot("tag4"),
            tag5: slot("tag5"),
            tag6: slot("tag6"),
            tag7: slot("tag7"),
        })
    }

    /// Lenient variant used at document creation: malformed payloads degrade
    /// to empty slots instead of failing the document.
    pub fn parse_or_empty(value: Option<&serde_json::Value>) -> Self {
        match value {
            Some(raw) => match Self::from_value(raw) {
                Ok(slots) => slots,
                Err(error) => {
                    tracing::warn!(error = %error, "Ignoring malformed tag payload");
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tag1.is_none()
            && self.tag2.is_none()
            && self.tag3.is_none()
            && self.tag4.is_none()
            && self.tag5.is_none()
            && self.tag6.is_none()
            && self.tag7.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_object() {
        let value = json!({"tag1": "alpha", "tag4": "delta"});
        let slots = TagSlots::from_value(&value).unwrap();

        assert_eq!(slots.tag1.as_deref(), Some("alpha"));
        assert_eq!(slots.tag4.as_deref(), Some("delta"));
        assert!(slots.tag2.is_none());
        assert!(!slots.is_empty());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(TagSlots::from_value(&json!("not an object")).is_err());
        assert!(TagSlots::from_value(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_parse_or_empty_degrades() {
        let slots = TagSlots::parse_or_empty(Some(&json!(42)));
        assert!(slots.is_empty());

        let slots = TagSlots::parse_or_empty(None);
        assert!(slots.is_empty());
    }

    #[test]
    fn test_non_string_values_ignored() {
        let value = json!({"tag1": 7, "tag2": "beta"});
        let slots = TagSlots::from_value(&value).unwrap();

        assert!(slots.tag1.is_none());
        assert_eq!(slots.tag2.as_deref(), Some("beta"));
    }
}
