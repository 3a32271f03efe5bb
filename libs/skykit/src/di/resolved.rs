use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::di::dependency::Instance;
use crate::di::error::DiError;

/// Resolved dependencies handed to a factory, provider or function.
#[derive(Default)]
pub struct Resolved {
    consumer: String,
    values: HashMap<String, Option<Instance>>,
}

impl Resolved {
    pub(crate) fn new(consumer: impl Into<String>, values: HashMap<String, Option<Instance>>) -> Self {
        Self {
            consumer: consumer.into(),
            values,
        }
    }

    /// Name of whatever requested these dependencies.
    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    pub fn contains(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(Some(_)))
    }

    pub fn raw(&self, name: &str) -> Option<Instance> {
        self.values.get(name).cloned().flatten()
    }

    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, DiError> {
        self.optional(name)?.ok_or_else(|| DiError::Unresolvable {
            dependency: name.to_string(),
            consumer: self.consumer.clone(),
        })
    }

    /// A clone of the resolved value, for plain bound data.
    pub fn value<T: Any + Send + Sync + Clone>(&self, name: &str) -> Result<T, DiError> {
        self.get::<T>(name).map(|v| (*v).clone())
    }

    pub fn optional<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>, DiError> {
        match self.raw(name) {
            None => Ok(None),
            Some(instance) => instance
                .downcast::<T>()
                .map(Some)
                .map_err(|_| DiError::TypeMismatch {
                    dependency: name.to_string(),
                    expected: std::any::type_name::<T>(),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_access_checks_the_type() {
        let mut values = HashMap::new();
        values.insert("n".to_string(), Some(Arc::new(5_i64) as Instance));
        values.insert("missing".to_string(), None);
        let resolved = Resolved::new("Thing", values);

        assert_eq!(resolved.value::<i64>("n").unwrap(), 5);
        assert!(matches!(
            resolved.get::<String>("n"),
            Err(DiError::TypeMismatch { .. })
        ));
        assert!(resolved.optional::<i64>("missing").unwrap().is_none());
        match resolved.get::<i64>("missing") {
            Err(DiError::Unresolvable { dependency, consumer }) => {
                assert_eq!(dependency, "missing");
                assert_eq!(consumer, "Thing");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
