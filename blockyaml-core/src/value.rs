use indexmap::IndexMap;

/// A fully materialized YAML node.
#[derive(Debug, Clone, PartialEq)]
pub enum YamlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<YamlValue>),
    Map(IndexMap<String, YamlValue>),
}

impl YamlValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            YamlValue::Null => "null",
            YamlValue::Bool(_) => "boolean",
            YamlValue::Int(_) => "integer",
            YamlValue::Float(_) => "float",
            YamlValue::Str(_) => "string",
            YamlValue::Seq(_) => "sequence",
            YamlValue::Map(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, YamlValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            YamlValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[YamlValue]> {
        match self {
            YamlValue::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, YamlValue>> {
        match self {
            YamlValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&YamlValue> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl From<&str> for YamlValue {
    fn from(value: &str) -> Self {
        YamlValue::Str(value.to_string())
    }
}

impl From<String> for YamlValue {
    fn from(value: String) -> Self {
        YamlValue::Str(value)
    }
}

impl From<i64> for YamlValue {
    fn from(value: i64) -> Self {
        YamlValue::Int(value)
    }
}

impl From<bool> for YamlValue {
    fn from(value: bool) -> Self {
        YamlValue::Bool(value)
    }
}

impl From<Vec<YamlValue>> for YamlValue {
    fn from(value: Vec<YamlValue>) -> Self {
        YamlValue::Seq(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_only_reads_mappings() {
        let mut map = IndexMap::new();
        map.insert("a".to_string(), YamlValue::Int(1));
        let value = YamlValue::Map(map);

        assert_eq!(value.get("a"), Some(&YamlValue::Int(1)));
        assert_eq!(value.get("b"), None);
        assert_eq!(YamlValue::from("a").get("a"), None);
    }

    #[test]
    fn type_names_cover_scalars_and_containers() {
        assert_eq!(YamlValue::Null.type_name(), "null");
        assert_eq!(YamlValue::from(3).type_name(), "integer");
        assert_eq!(YamlValue::from(vec![]).type_name(), "sequence");
    }
}
