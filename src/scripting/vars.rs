//! Script variables and `$name` interpolation

use std::collections::HashMap;

/// Named string values set by `set_var` and `input_var`
#[derive(Debug, Default, Clone)]
pub struct VariableStore {
    values: HashMap<String, String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous one
    pub fn set(&mut self, name: &str, value: String) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace every `$name` of a defined variable with its value
    ///
    /// One left-to-right pass: at each `$` the longest defined name wins, so
    /// `$ID2` is not clobbered by `$ID`. Substituted values are not scanned
    /// again. Unknown references are left as written.
    pub fn interpolate(&self, line: &str) -> String {
        if self.values.is_empty() || !line.contains('$') {
            return line.to_string();
        }

        let mut names: Vec<&str> = self
            .values
            .keys()
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let mut out = String::with_capacity(line.len());
        let mut rest = line;
        while let Some(idx) = rest.find('$') {
            out.push_str(&rest[..idx]);
            let after = &rest[idx + 1..];
            match names.iter().find(|name| after.starts_with(**name)) {
                Some(name) => {
                    out.push_str(&self.values[*name]);
                    rest = &after[name.len()..];
                }
                None => {
                    out.push('$');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(pairs: &[(&str, &str)]) -> VariableStore {
        let mut store = VariableStore::new();
        for (name, value) in pairs {
            store.set(name, value.to_string());
        }
        store
    }

    #[test]
    fn test_interpolate() {
        let store = store(&[("FOO", "bar"), ("ID", "123")]);
        let cases = [
            ("hello $FOO", "hello bar"),
            ("id is $ID", "id is 123"),
            ("no var here", "no var here"),
            ("$FOO$ID", "bar123"),
            ("mixed $FOO and $UNKNOWN", "mixed bar and $UNKNOWN"),
        ];
        for (input, expected) in cases {
            assert_eq!(store.interpolate(input), expected);
        }
    }

    #[test]
    fn test_interpolate_longest_name_first() {
        let store = store(&[("ID", "short"), ("ID2", "long")]);
        assert_eq!(store.interpolate("$ID2 $ID"), "long short");
    }

    #[test]
    fn test_interpolate_does_not_mutate() {
        let store = store(&[("A", "$B"), ("B", "x")]);
        let before = store.clone();
        assert_eq!(store.interpolate("$A $B"), "$B x");
        assert_eq!(store.get("A"), before.get("A"));
        assert_eq!(store.get("B"), before.get("B"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let store = store(&[("LONGNAME", "cost $ID"), ("ID", "7")]);
        assert_eq!(store.interpolate("$LONGNAME"), "cost $ID");
        assert_eq!(store.interpolate("$ID $LONGNAME $ID"), "7 cost $ID 7");
        assert_eq!(store.interpolate("$$ID"), "$7");
    }

    #[test]
    fn test_later_writes_overwrite() {
        let mut store = store(&[("X", "1")]);
        store.set("X", "2".to_string());
        assert_eq!(store.get("X"), Some("2"));
        assert_eq!(store.len(), 1);
    }
}
