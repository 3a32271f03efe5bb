//! Model-class references as seen by the configuration layer.
//!
//! The model layer itself lives elsewhere; configs only need a name and the list of
//! columns to cross-validate `ModelColumn`/`ModelColumns` values.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub trait ModelReference: Send + Sync {
    fn name(&self) -> &str;
    fn columns(&self) -> Vec<String>;

    fn has_column(&self, column: &str) -> bool {
        self.columns().iter().any(|c| c == column)
    }
}

/// A fixed model description, handy for hosts that describe models in config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    name: String,
    columns: Vec<String>,
}

impl ModelSchema {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn shared(self) -> Arc<dyn ModelReference> {
        Arc::new(self)
    }
}

impl ModelReference for ModelSchema {
    fn name(&self) -> &str {
        &self.name
    }

    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }
}
