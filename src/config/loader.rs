use super::Config;
use crate::error::RuleError;
use crate::todo::TODO_FILE;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rules for core Ruby, always loaded first
pub const DEFAULT_PROFILE: &str = include_str!("default.yml");

/// Rule profiles for common gems, enabled with `gems:`
pub const GEM_PROFILES: &[(&str, &str)] = &[
    ("minitest", include_str!("gems/minitest.yml")),
    ("rspec", include_str!("gems/rspec.yml")),
];

/// Project configuration files, in lookup order
pub const CONFIG_NAMES: [&str; 3] = [".leftovers.yml", ".leftovers.yaml", ".leftovers.toml"];

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => Self::from_yaml(&contents)
                .wrap_err_with(|| format!("Failed to parse YAML config {}", path.display())),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to parse TOML config {}", path.display())),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = Self::from_yaml(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err_with(|| format!("Failed to parse config file {}", path.display()))
                }
            }
        }
    }

    /// An empty document is an empty configuration
    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).into_diagnostic()
    }

    /// The built-in Ruby profile
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(DEFAULT_PROFILE).wrap_err("Failed to parse the built-in Ruby profile")
    }

    /// The built-in profile of `gem`
    pub fn gem(gem: &str) -> Result<Self> {
        let Some((_, profile)) = GEM_PROFILES.iter().find(|(name, _)| *name == gem) else {
            let known: Vec<&str> = GEM_PROFILES.iter().map(|(name, _)| *name).collect();
            return Err(RuleError::invalid(
                "gems",
                format!("no built-in profile for gem {gem:?}, known gems are {}", known.join(", ")),
                &serde_yaml::Value::String(gem.to_string()),
            )
            .into());
        };
        Self::from_yaml(profile).wrap_err_with(|| format!("Failed to parse the built-in {gem} profile"))
    }

    /// Try to load the project configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Option<Self>> {
        for name in &CONFIG_NAMES {
            let path = project_root.join(name);
            if path.exists() {
                debug!("Using config file {}", path.display());
                return Self::from_file(&path).map(Some);
            }
        }

        Ok(None)
    }
}

/// Builds the layered configuration of a project
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    root: PathBuf,
    file: Option<PathBuf>,
    todo: bool,
}

impl ConfigLoader {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            file: None,
            todo: true,
        }
    }

    /// Use this file instead of looking in the default locations
    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    /// Leave out the todo file, for regenerating it
    pub fn without_todo(mut self) -> Self {
        self.todo = false;
        self
    }

    pub fn load(&self) -> Result<Config> {
        let mut config = Config::builtin()?;

        let project = match &self.file {
            Some(path) => Some(Config::from_file(path)?),
            None => Config::from_default_locations(&self.root)?,
        };
        let todo_path = self.root.join(TODO_FILE);
        let todo = if self.todo && todo_path.exists() {
            debug!("Reading {}", todo_path.display());
            Some(Config::from_file(&todo_path)?)
        } else {
            None
        };

        let mut requested: Vec<String> = config.gems.clone();
        requested.extend(project.iter().flat_map(|p| p.gems.iter().cloned()));
        for gem in Self::gem_layers(requested)? {
            config.merge(gem);
        }

        match project {
            Some(project) => config.merge(project),
            None => info!("No .leftovers.yml found, using the built-in Ruby profile only"),
        }
        if let Some(todo) = todo {
            config.merge(todo);
        }

        Ok(config)
    }

    /// Gem profiles in request order, following gems that profiles enable
    fn gem_layers(mut pending: Vec<String>) -> Result<Vec<Config>> {
        let mut loaded: Vec<String> = Vec::new();
        let mut layers = Vec::new();
        pending.reverse();
        while let Some(gem) = pending.pop() {
            if loaded.contains(&gem) {
                continue;
            }
            debug!("Loading the {} profile", gem);
            let layer = Config::gem(&gem)?;
            pending.extend(layer.gems.iter().rev().cloned());
            loaded.push(gem);
            layers.push(layer);
        }
        Ok(layers)
    }
}
