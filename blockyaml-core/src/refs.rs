use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::YamlValue;

/// Anchor name to value table for one top-level parse.
///
/// Cloning hands out another handle to the same table, so anchors bound by
/// any child parser are visible to every later alias in the document.
#[derive(Debug, Clone, Default)]
pub(crate) struct RefTable {
    anchors: Rc<RefCell<HashMap<String, YamlValue>>>,
}

impl RefTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bind(&self, name: &str, value: YamlValue) {
        self.anchors.borrow_mut().insert(name.to_string(), value);
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<YamlValue> {
        self.anchors.borrow().get(name).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.anchors.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_share_bindings() {
        let table = RefTable::new();
        let child = table.clone();
        child.bind("base", YamlValue::Int(1));

        assert_eq!(table.resolve("base"), Some(YamlValue::Int(1)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn rebinding_replaces_value() {
        let table = RefTable::new();
        table.bind("a", YamlValue::from("first"));
        table.bind("a", YamlValue::from("second"));

        assert_eq!(table.resolve("a"), Some(YamlValue::from("second")));
        assert_eq!(table.resolve("b"), None);
    }
}
