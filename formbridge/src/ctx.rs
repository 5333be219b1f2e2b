//! Application context.
//!
//! [`AppContext`] holds what every command needs: the loaded configuration,
//! the schema builder, the component registry and the validation engine.

use std::path::{Path, PathBuf};

use formprune::SchemaBuilder;

use crate::{
    config::BridgeConfig,
    error::BridgeResult,
    plugins::{ComponentRegistry, CustomComponent},
    validate::{ProcessValidator, Unconfigured, Validator},
};

pub struct AppContext {
    /// Loaded configuration.
    pub config: BridgeConfig,
    /// Where the configuration came from, if a file was read.
    pub config_path: Option<PathBuf>,
    /// Directory relative paths resolve against.
    pub workdir: PathBuf,
    /// Shape inference, set up from `repeating_types`.
    pub builder: SchemaBuilder,
    pub registry: ComponentRegistry,
    validator: Box<dyn Validator>,
}

impl AppContext {
    /// Builds a context from an already loaded configuration.
    pub fn new(config: BridgeConfig, workdir: &Path) -> Self {
        let builder = SchemaBuilder::new(&config.repeating_types);
        let mut ctx = Self {
            config,
            config_path: None,
            workdir: workdir.to_path_buf(),
            builder,
            registry: ComponentRegistry::new(),
            validator: Box::new(Unconfigured),
        };

        if let Some(validator) = ctx.config.validator.clone() {
            let resource_dir = ctx.resource_dir();
            let workdir = ctx.workdir.clone();
            let replace_dir = workdir.clone();
            let engine = ProcessValidator::new(&validator, &workdir, move |s| {
                value_replace_with_var(s, &resource_dir, &replace_dir)
            });
            ctx.validator = Box::new(engine);
        }
        debug!("validation engine: {}", ctx.validator.name());
        ctx
    }

    /// Loads the configuration from `config_path`, or the default file in
    /// `workdir`, and builds a context from it.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration cannot be read.
    pub fn load(config_path: Option<&Path>, workdir: &Path) -> BridgeResult<Self> {
        let config = BridgeConfig::load(config_path, workdir)?;
        let mut ctx = Self::new(config, workdir);
        ctx.config_path = config_path
            .map(Path::to_path_buf)
            .or_else(|| {
                let default = workdir.join(crate::config::DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            });
        Ok(ctx)
    }

    /// Points the context at another resource directory.
    ///
    /// A configured engine is rebuilt so `${resourceDir}` follows the new
    /// directory. Everything else, including where the configuration came
    /// from, is kept.
    pub fn with_resource_dir(self, dir: impl Into<PathBuf>) -> Self {
        let mut config = self.config;
        config.resource_dir = Some(dir.into());
        let mut ctx = Self::new(config, &self.workdir);
        ctx.config_path = self.config_path;
        ctx.registry = self.registry;
        if ctx.config.validator.is_none() {
            ctx.validator = self.validator;
        }
        ctx
    }

    /// Replaces the validation engine.
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    pub fn validator(&self) -> &dyn Validator {
        self.validator.as_ref()
    }

    /// The resource directory, resolved against the working directory.
    pub fn resource_dir(&self) -> PathBuf {
        match &self.config.resource_dir {
            Some(dir) => self.workdir.join(dir),
            None => self.workdir.clone(),
        }
    }

    /// Custom components of the resource directory.
    pub fn components(&self) -> Vec<CustomComponent> {
        self.registry.components(&self.resource_dir())
    }

    /// Expands `${resourceDir}` and `${workdir}` in `value`.
    pub fn value_replace_with_var<S>(&self, value: S) -> String
    where
        S: AsRef<std::ffi::OsStr>,
    {
        value_replace_with_var(value, &self.resource_dir(), &self.workdir)
    }
}

fn value_replace_with_var<S>(value: S, resource_dir: &Path, workdir: &Path) -> String
where
    S: AsRef<std::ffi::OsStr>,
{
    let raw = value.as_ref().to_string_lossy();
    raw.replace("${resourceDir}", &resource_dir.display().to_string())
        .replace("${workdir}", &workdir.display().to_string())
}
