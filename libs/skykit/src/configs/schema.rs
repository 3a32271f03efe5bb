use std::collections::HashMap;

use crate::configs::field::ConfigField;

/// Class-level table of declared configs for one owning type.
///
/// Built once per type and never mutated afterwards; every instance's
/// [`ConfigStore`](crate::ConfigStore) points back at it.
#[derive(Debug, Clone)]
pub struct ConfigSchema {
    owner: &'static str,
    fields: Vec<ConfigField>,
    index: HashMap<&'static str, usize>,
}

impl ConfigSchema {
    pub fn new(owner: &'static str) -> Self {
        Self {
            owner,
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Declare a config. Re-declaring a name replaces the earlier declaration
    /// but keeps its position.
    pub fn field(mut self, field: ConfigField) -> Self {
        match self.index.get(field.name()) {
            Some(&i) => self.fields[i] = field,
            None => {
                self.index.insert(field.name(), self.fields.len());
                self.fields.push(field);
            }
        }
        self
    }

    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// Declaration order.
    pub fn fields(&self) -> &[ConfigField] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&ConfigField> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(ConfigField::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclaring_keeps_position() {
        let schema = ConfigSchema::new("Thing")
            .field(ConfigField::string("a"))
            .field(ConfigField::integer("b"))
            .field(ConfigField::string("a").required());

        let names: Vec<_> = schema.names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(schema.get("a").unwrap().is_required());
    }
}
