//! Status dump parsing
//!
//! `status?` answers with `key:value` pairs separated by semicolons, e.g.
//! `pitch:0;roll:0;yaw:0;bat:81;h:120;`. Only a debug view is built from it.

/// Placeholder value for an item without a `:` separator
pub const MISSING_VALUE: &str = "N/A";

/// One `key:value` item of a status dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusField {
    pub key: String,
    pub value: String,
}

/// Parsed status dump, in the order the vehicle reported it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryStatus {
    fields: Vec<StatusField>,
}

impl TelemetryStatus {
    /// Parse a raw status string; never fails
    pub fn parse(raw: &str) -> Self {
        let fields = raw
            .split(';')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| match item.split_once(':') {
                Some((key, value)) => StatusField {
                    key: key.trim().to_string(),
                    value: value.trim().to_string(),
                },
                None => StatusField {
                    key: item.to_string(),
                    value: MISSING_VALUE.to_string(),
                },
            })
            .collect();

        Self { fields }
    }

    pub fn fields(&self) -> &[StatusField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Raw value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }

    /// Integer value for a key, if it parses
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Battery percentage, when reported
    pub fn battery_percent(&self) -> Option<i64> {
        self.get_i64("bat")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let status = TelemetryStatus::parse("bat:81;h:120;");
        assert_eq!(status.len(), 2);
        assert_eq!(status.get_i64("bat"), Some(81));
        assert_eq!(status.get_i64("h"), Some(120));
        assert_eq!(status.battery_percent(), Some(81));
    }

    #[test]
    fn test_item_without_separator() {
        let status = TelemetryStatus::parse("bat:81;item;");
        assert_eq!(status.get("item"), Some(MISSING_VALUE));
        assert_eq!(status.get_i64("item"), None);
    }

    #[test]
    fn test_real_dump_keeps_order_and_signs() {
        let raw = "mid:-1;x:0;y:0;z:0;pitch:1;roll:-2;templ:62;agx:-6.00;bat:55;\r\n";
        let status = TelemetryStatus::parse(raw);

        let keys: Vec<&str> = status.fields().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(
            keys,
            ["mid", "x", "y", "z", "pitch", "roll", "templ", "agx", "bat"]
        );
        assert_eq!(status.get_i64("roll"), Some(-2));
        assert_eq!(status.get("agx"), Some("-6.00"));
        assert_eq!(status.battery_percent(), Some(55));
    }

    #[test]
    fn test_empty_input() {
        assert!(TelemetryStatus::parse("").is_empty());
        assert!(TelemetryStatus::parse(";;").is_empty());
    }
}
