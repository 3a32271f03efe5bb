//! Declared configs on a type: population, finalize, reads and cross-validation.

use std::sync::{Arc, LazyLock};

use serde_json::json;
use skykit::{
    Callable, ConfigError, ConfigField, ConfigSchema, ConfigStore, ConfigType, ConfigValue,
    Configurable, Container, Dependency, MaximumLength, ModelSchema, Required, Validator,
};

static HAS_CONFIGS: LazyLock<ConfigSchema> = LazyLock::new(|| {
    ConfigSchema::new("HasConfigs")
        .field(ConfigField::string("name").required())
        .field(ConfigField::integer("age").default(0))
        .field(ConfigField::string_list("tags"))
        .field(ConfigField::boolean("active").default(true))
        .field(ConfigField::float("ratio"))
});

#[derive(Debug)]
struct HasConfigs {
    configs: ConfigStore,
}

impl HasConfigs {
    fn new<I, K, V>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ConfigValue>,
    {
        let mut this = Self {
            configs: ConfigStore::new(Self::schema()),
        };
        this.configs.assign_all(args)?;
        this.finalize_and_validate_configuration()?;
        Ok(this)
    }
}

impl Configurable for HasConfigs {
    fn schema() -> &'static ConfigSchema {
        &HAS_CONFIGS
    }

    fn configs(&self) -> &ConfigStore {
        &self.configs
    }

    fn configs_mut(&mut self) -> &mut ConfigStore {
        &mut self.configs
    }
}

#[test]
fn defaults_apply_to_unset_configs() {
    let bob = HasConfigs::new([("name", "Bob")]).unwrap();
    assert_eq!(bob.configs().string("name").unwrap(), Some("Bob"));
    assert_eq!(bob.configs().integer("age").unwrap(), Some(0));
    assert_eq!(bob.configs().boolean("active").unwrap(), Some(true));
    assert_eq!(bob.configs().string_list("tags").unwrap(), None);
}

#[test]
fn missing_required_config_names_class_and_attribute() {
    let err = HasConfigs::new(Vec::<(&str, ConfigValue)>::new()).unwrap_err();
    assert_eq!(
        err,
        ConfigError::MissingRequired {
            owner: "HasConfigs",
            attribute: "name".into(),
        }
    );
    assert_eq!(
        err.to_string(),
        "Missing required configuration property 'name' for class 'HasConfigs'"
    );
}

#[test]
fn wrong_shapes_fail_at_assignment() {
    let mut store = ConfigStore::new(HasConfigs::schema());
    let err = store.assign("name", 5).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("HasConfigs"));
    assert!(message.contains("name"));
    assert!(message.contains("'integer'"));
    assert!(message.contains("a string"));

    // booleans never accept truthy stand-ins
    assert!(store.assign("active", 1).is_err());
    assert!(store.assign("active", "true").is_err());

    let err = store.assign("ratio", 1).unwrap_err();
    assert!(matches!(err, ConfigError::TypeMismatch { .. }));
    assert!(err.to_string().contains("'integer'"));
    assert!(err.to_string().contains("a float"));
    store.assign("ratio", 1.0).unwrap();

    assert!(matches!(
        store.assign("nickname", "B"),
        Err(ConfigError::UnknownConfig { .. })
    ));
}

#[test]
fn assigned_lists_are_copies() {
    let mut tags = vec!["a".to_string()];
    let mut store = ConfigStore::new(HasConfigs::schema());
    store.assign("name", "Bob").unwrap();
    store.assign("tags", &tags).unwrap();
    tags.push("b".to_string());
    store.finalize().unwrap();

    assert_eq!(
        store.string_list("tags").unwrap(),
        Some(&["a".to_string()][..])
    );
}

#[test]
fn reads_before_finalize_fail() {
    let mut store = ConfigStore::new(HasConfigs::schema());
    store.assign("name", "Bob").unwrap();
    assert!(matches!(
        store.read("name"),
        Err(ConfigError::NotFinalized { .. })
    ));
    store.finalize().unwrap();
    store.finalize().unwrap();
    assert_eq!(store.read("name").unwrap(), &ConfigValue::from("Bob"));
}

#[test]
fn positional_arguments_follow_declaration_order() {
    let mut store = ConfigStore::new(HasConfigs::schema());
    store
        .assign_positional([ConfigValue::from("Ann"), ConfigValue::from(41)])
        .unwrap();
    store.finalize().unwrap();
    assert_eq!(store.integer("age").unwrap(), Some(41));

    let mut store = ConfigStore::new(HasConfigs::schema());
    let err = store
        .assign_positional((0..6_i64).map(ConfigValue::from))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::TooManyArguments {
            declared: 5,
            given: 6,
            ..
        }
    ));
}

#[test]
fn json_population_does_not_coerce() {
    let mut store = ConfigStore::new(HasConfigs::schema());
    let args = json!({"name": "Bob", "age": 7, "tags": ["x", "y"]});
    store.assign_json_map(args.as_object().unwrap()).unwrap();
    store.finalize().unwrap();
    assert_eq!(store.integer("age").unwrap(), Some(7));
    assert_eq!(store.string_list("tags").unwrap().map(|t| t.len()), Some(2));

    let mut store = ConfigStore::new(HasConfigs::schema());
    assert!(store.assign_json("active", json!("true")).is_err());
    assert!(store.assign_json("tags", json!(["x", 1])).is_err());
}

static SORTED: LazyLock<ConfigSchema> = LazyLock::new(|| {
    ConfigSchema::new("Sorted")
        .field(ConfigField::model_class("model_class").required())
        .field(ConfigField::model_column("sort_column", "model_class").default("name"))
        .field(ConfigField::model_columns("readable", "model_class"))
        .field(ConfigField::select("direction", &["asc", "desc"]).default("asc"))
});

static MISDECLARED: LazyLock<ConfigSchema> = LazyLock::new(|| {
    ConfigSchema::new("Misdeclared")
        .field(ConfigField::select("direction", &["asc", "desc"]).default("asc"))
        .field(ConfigField::string("broken").depends_on("direction"))
});

fn users() -> Arc<dyn skykit::ModelReference> {
    ModelSchema::new("User", ["id", "name", "email"]).shared()
}

#[test]
fn column_configs_are_checked_against_the_model() {
    let mut store = ConfigStore::new(&SORTED);
    store.assign("model_class", users()).unwrap();
    store.assign("readable", ["id", "email"]).unwrap();
    store.finalize().unwrap();
    assert_eq!(store.string("sort_column").unwrap(), Some("name"));
    assert_eq!(store.model("model_class").unwrap().unwrap().name(), "User");

    let mut store = ConfigStore::new(&SORTED);
    store.assign("model_class", users()).unwrap();
    store.assign("readable", ["id", "password"]).unwrap();
    match store.finalize().unwrap_err() {
        ConfigError::UnknownColumn {
            value,
            model,
            expected,
            ..
        } => {
            assert_eq!(value, "password");
            assert_eq!(model, "User");
            assert_eq!(expected, vec!["id", "name", "email"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn depends_on_must_name_a_model_class_config() {
    let mut store = ConfigStore::new(&MISDECLARED);
    store.assign("broken", "x").unwrap();
    assert!(matches!(
        store.finalize(),
        Err(ConfigError::BadDependsOn {
            depends_on: "direction",
            ..
        })
    ));
}

#[test]
fn select_rejects_values_outside_the_list() {
    let mut store = ConfigStore::new(&SORTED);
    let err = store.assign("direction", "sideways").unwrap_err();
    assert!(err.to_string().contains("'asc', 'desc'"));
}

static COMPUTED: LazyLock<ConfigSchema> = LazyLock::new(|| {
    ConfigSchema::new("Computed")
        .field(ConfigField::new("label", ConfigType::StringOrCallable).required())
        .field(ConfigField::new("validators", ConfigType::Validators))
        .field(
            ConfigField::new("options", ConfigType::AnyDict).accepted_keys(&["timeout", "retries"]),
        )
        .field(ConfigField::string_matching("slug", "[a-z-]+$").unwrap())
        .field(ConfigField::integer("limit").check(|_, value| match value {
            ConfigValue::Int(n) if *n > 0 => Ok(()),
            _ => Err("must be positive".to_string()),
        }))
});

#[test]
fn callable_values_are_resolved_through_the_container() {
    let container = Container::builder()
        .without_auto_providers()
        .bind("prefix", "user".to_string())
        .build();
    let label = Callable::new("make_label", vec![Dependency::named("prefix")], |deps| {
        Ok(ConfigValue::from(format!("{}-label", deps.value::<String>("prefix")?)))
    });

    let mut store = ConfigStore::new(&COMPUTED);
    store.assign("label", label).unwrap();
    store.finalize().unwrap();
    assert_eq!(
        store.resolve("label", &container).unwrap(),
        ConfigValue::from("user-label")
    );

    let mut plain = ConfigStore::new(&COMPUTED);
    plain.assign("label", "fixed").unwrap();
    plain.finalize().unwrap();
    assert_eq!(
        plain.resolve("label", &container).unwrap(),
        ConfigValue::from("fixed")
    );
}

#[test]
fn callables_producing_the_wrong_shape_fail() {
    let container = Container::builder().without_auto_providers().build();
    let mut store = ConfigStore::new(&COMPUTED);
    store
        .assign("label", Callable::new("bad", vec![], |_| Ok(ConfigValue::from(3))))
        .unwrap();
    store.finalize().unwrap();
    assert!(store.resolve("label", &container).is_err());
}

#[test]
fn validators_normalize_and_can_be_appended() {
    let mut store = ConfigStore::new(&COMPUTED);
    store.assign("label", "x").unwrap();
    store
        .assign("validators", Arc::new(Required) as Arc<dyn Validator>)
        .unwrap();
    store.finalize().unwrap();
    assert_eq!(store.validators("validators").unwrap().len(), 1);

    let max: Arc<dyn Validator> = Arc::new(MaximumLength::new(5).unwrap());
    store.push_validator("validators", max).unwrap();
    let names: Vec<&str> = store
        .validators("validators")
        .unwrap()
        .iter()
        .map(|v| v.name())
        .collect();
    assert_eq!(names, vec!["Required", "MaximumLength"]);

    // the value may change but not its type
    let err = store
        .update("validators", |v| *v = ConfigValue::from("nope"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::TypeMismatch { .. }));
    assert_eq!(store.validators("validators").unwrap().len(), 2);
}

#[test]
fn custom_checks_run_during_finalize() {
    let mut store = ConfigStore::new(&COMPUTED);
    store.assign("label", "x").unwrap();
    store
        .assign_json("options", json!({"timeout": 3, "verbose": true}))
        .unwrap();
    let err = store.finalize().unwrap_err();
    assert!(err.to_string().contains("'verbose'"));

    let mut store = ConfigStore::new(&COMPUTED);
    store.assign("label", "x").unwrap();
    store.assign("limit", -1).unwrap();
    assert!(matches!(
        store.finalize(),
        Err(ConfigError::InvalidValue { .. })
    ));

    let mut store = ConfigStore::new(&COMPUTED);
    assert!(store.assign("slug", "Not A Slug").is_err());
    // the pattern must match from the first character
    assert!(store.assign("slug", "99-a-slug").is_err());
    store.assign("slug", "a-slug").unwrap();
}

#[test]
fn invalid_declared_patterns_are_errors() {
    match ConfigField::string_matching("broken", "(").unwrap_err() {
        ConfigError::InvalidPattern {
            attribute, pattern, ..
        } => {
            assert_eq!(attribute, "broken");
            assert_eq!(pattern, "(");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

static ORDERED: LazyLock<ConfigSchema> = LazyLock::new(|| {
    ConfigSchema::new("Ordered")
        .field(ConfigField::select("order", &["asc", "desc"]).default("asc"))
});

#[test]
fn updates_are_checked_like_assignments() {
    let mut store = ConfigStore::new(&ORDERED);
    store.finalize().unwrap();

    let err = store
        .update("order", |v| *v = ConfigValue::from("sideways"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
    assert_eq!(store.string("order").unwrap(), Some("asc"));

    store
        .update("order", |v| *v = ConfigValue::from("desc"))
        .unwrap();
    assert_eq!(store.string("order").unwrap(), Some("desc"));
}
