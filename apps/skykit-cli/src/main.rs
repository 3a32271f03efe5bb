use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use skykit::{
    Configurable, ConfigField, ConfigSchema, ConfigStore, Container, Dependency, DiError,
    Environment, Inject, Injectable, InjectableProperties, Instance, Resolved, UuidGenerator,
};
use skykit_bootstrap::{AppConfig, AppConfigProvider, CliArgs, ConfigProvider};

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

/// Skykit - resolve and inspect container dependencies from the command line
#[derive(Parser)]
#[command(name = "skykit")]
#[command(about = "Skykit - resolve and inspect container dependencies")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// `.env` file for the `environment` dependency (overrides config)
    #[arg(long)]
    env_file: Option<String>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed a container and check every registered class can be built
    Check,
    /// Build a dependency by name and print it as JSON
    Resolve { name: String },
    /// Print a fresh identifier
    Uuid,
    /// Print the current UTC time
    Now,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        env_file: cli.env_file.clone(),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // 1) defaults -> 2) YAML (if provided) -> 3) env (APP__*) -> 4) CLI overrides
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    skykit_bootstrap::init_logging(&logging_config, Path::new(&config.server.home_dir));

    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    // One container per invocation.
    let container = seed_container(config);

    match cli.command.unwrap_or(Commands::Check) {
        Commands::Check => {
            container
                .validate()
                .context("container configuration is inconsistent")?;
            tracing::info!("container check passed");
            println!("ok");
        }
        Commands::Resolve { name } => {
            let instance = container
                .build_from_name(&name, true)
                .with_context(|| format!("failed to resolve '{name}'"))?;
            let rendered = render_instance(&instance)
                .ok_or_else(|| anyhow!("'{name}' resolved to a value that cannot be shown"))?;
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
        Commands::Uuid => {
            let uuid = container.build_typed::<UuidGenerator>("uuid", true)?;
            println!("{}", uuid.v4());
        }
        Commands::Now => {
            let now = container.build_typed::<DateTime<Utc>>("utcnow", false)?;
            println!("{}", now.to_rfc3339());
        }
    }
    Ok(())
}

/// Container seeded from the loaded configuration: every `bindings` entry, the
/// `.env` location for `environment`, the configuration itself and the
/// components this binary knows about.
fn seed_container(config: AppConfig) -> Container {
    let mut builder = Container::builder();
    for (name, value) in &config.bindings {
        builder = builder.bind_json(name.clone(), value.clone());
    }
    if let Some(path) = config.env_file_path() {
        builder = builder.bind("env_file_path", path.to_string_lossy().to_string());
    }
    builder
        .bind(APP_CONFIG, AppConfigProvider::new(config))
        .class::<Greeter>()
        .build()
}

const APP_CONFIG: &str = "app_config";

/// JSON view of the values the CLI knows how to show.
fn render_instance(instance: &Instance) -> Option<Value> {
    let any = instance.as_ref();
    if let Some(s) = any.downcast_ref::<String>() {
        return Some(json!(s));
    }
    if let Some(i) = any.downcast_ref::<i64>() {
        return Some(json!(i));
    }
    if let Some(f) = any.downcast_ref::<f64>() {
        return Some(json!(f));
    }
    if let Some(b) = any.downcast_ref::<bool>() {
        return Some(json!(b));
    }
    if let Some(v) = any.downcast_ref::<Value>() {
        return Some(v.clone());
    }
    if let Some(t) = any.downcast_ref::<DateTime<Utc>>() {
        return Some(json!(t.to_rfc3339()));
    }
    if let Some(t) = any.downcast_ref::<DateTime<Local>>() {
        return Some(json!(t.to_rfc3339()));
    }
    if let Some(u) = any.downcast_ref::<UuidGenerator>() {
        return Some(json!(u.v4().to_string()));
    }
    if let Some(env) = any.downcast_ref::<Environment>() {
        return Some(json!({ "env_file": env.env_file().map(|p| p.display().to_string()) }));
    }
    if let Some(g) = any.downcast_ref::<Greeter>() {
        return g.message().ok().map(Value::String);
    }
    None
}

// ---------- demo component ----------

static GREETER_SCHEMA: LazyLock<ConfigSchema> = LazyLock::new(|| {
    ConfigSchema::new("Greeter")
        .field(ConfigField::string("name").required())
        .field(ConfigField::string("greeting").default("Hello"))
        .field(ConfigField::select("punctuation", &[".", "!"]).default("!"))
});

/// Greets whoever `components.greeter.name` names, stamped with a request id.
struct Greeter {
    configs: ConfigStore,
    uuid: Inject<UuidGenerator>,
}

impl Greeter {
    fn message(&self) -> Result<String, DiError> {
        let configs = self.configs();
        Ok(format!(
            "{} {}{} ({})",
            configs.string("greeting")?.unwrap_or_default(),
            configs.required_string("name")?,
            configs.string("punctuation")?.unwrap_or_default(),
            self.uuid.get()?.v4(),
        ))
    }
}

impl Configurable for Greeter {
    fn schema() -> &'static ConfigSchema {
        &GREETER_SCHEMA
    }

    fn configs(&self) -> &ConfigStore {
        &self.configs
    }

    fn configs_mut(&mut self) -> &mut ConfigStore {
        &mut self.configs
    }
}

impl Injectable for Greeter {
    const NAME: &'static str = "greeter";

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::named(APP_CONFIG)]
    }

    fn construct(deps: &Resolved) -> Result<Self, DiError> {
        let app = deps.get::<AppConfigProvider>(APP_CONFIG)?;
        let mut greeter = Greeter {
            configs: ConfigStore::new(Self::schema()),
            uuid: Inject::by_name("uuid"),
        };
        if let Some(Value::Object(args)) = app.component_config(Self::NAME) {
            greeter.configs.assign_json_map(args)?;
        }
        greeter.finalize_and_validate_configuration()?;
        Ok(greeter)
    }

    fn inject_properties(&self, container: &Container) {
        InjectableProperties::inject_properties(self, container);
    }
}

impl InjectableProperties for Greeter {
    fn inject_properties(&self, container: &Container) {
        self.uuid.attach(container);
    }
}
