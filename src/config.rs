//! Composer configuration
//!
//! Configuration is read from a TOML file and can be adjusted with builder
//! methods afterwards (the CLI overlays its flags this way). Relative
//! directories read from a file resolve against the directory holding it;
//! directories set through the builder are used as given.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::engine::EngineOptions;
use crate::loader::TemplateDir;
use crate::parser::Delimiters;

/// Errors that can occur when loading or applying configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid engine option '{option}'")]
    InvalidOption { option: String },
}

/// When fragments are read from disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    /// Re-read fragments on every composition
    None,
    /// Walk every directory once, when the composer is built
    #[default]
    PreloadOnce,
}

/// The directory a fragment kind lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateRole {
    Layouts,
    Views,
    Partials,
}

impl TemplateRole {
    pub const ALL: [TemplateRole; 3] = [Self::Layouts, Self::Views, Self::Partials];
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposerConfig {
    pub layouts_dir: Option<PathBuf>,
    pub views_dir: Option<PathBuf>,
    pub partials_dir: Option<PathBuf>,
    /// Directories never walked, in addition to the other template directories
    pub exclude_dirs: Vec<PathBuf>,
    /// Extension of template files, with or without the leading dot
    pub template_ext: Option<String>,
    /// Name fragments without their extension
    pub strip_ext: bool,
    pub left_delim: Option<String>,
    pub right_delim: Option<String>,
    /// Engine options such as `missingkey=error`
    pub options: Vec<String>,
    /// Layout used when a request names no base
    pub default_layout: Option<String>,
    pub cache_mode: CacheMode,
}

impl ComposerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_layouts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.layouts_dir = Some(dir.into());
        self
    }

    pub fn with_views_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.views_dir = Some(dir.into());
        self
    }

    pub fn with_partials_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.partials_dir = Some(dir.into());
        self
    }

    pub fn with_exclude_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exclude_dirs.push(dir.into());
        self
    }

    pub fn with_template_ext(mut self, ext: impl Into<String>) -> Self {
        self.template_ext = Some(ext.into());
        self
    }

    pub fn with_strip_ext(mut self, strip: bool) -> Self {
        self.strip_ext = strip;
        self
    }

    pub fn with_delims(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.left_delim = Some(left.into());
        self.right_delim = Some(right.into());
        self
    }

    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }

    pub fn with_default_layout(mut self, layout: impl Into<String>) -> Self {
        self.default_layout = Some(layout.into());
        self
    }

    pub fn with_cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Anchor every relative directory at `base`
    fn rebase(&mut self, base: &Path) {
        for dir in [
            &mut self.layouts_dir,
            &mut self.views_dir,
            &mut self.partials_dir,
        ]
        .into_iter()
        .flatten()
        .chain(self.exclude_dirs.iter_mut())
        {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Template extension with a leading dot, if one is configured
    pub fn extension(&self) -> Option<String> {
        let ext = self.template_ext.as_deref()?.trim();
        match ext {
            "" => None,
            e if e.starts_with('.') => Some(e.to_string()),
            e => Some(format!(".{}", e)),
        }
    }

    pub fn dir(&self, role: TemplateRole) -> Option<&PathBuf> {
        match role {
            TemplateRole::Layouts => self.layouts_dir.as_ref(),
            TemplateRole::Views => self.views_dir.as_ref(),
            TemplateRole::Partials => self.partials_dir.as_ref(),
        }
    }

    /// Directory settings for one fragment kind
    ///
    /// The other configured template directories are excluded, so a partials
    /// directory nested inside the views directory is not loaded twice.
    pub fn template_dir(&self, role: TemplateRole) -> Option<TemplateDir> {
        let path = self.dir(role)?.clone();
        let mut exclude: Vec<PathBuf> = TemplateRole::ALL
            .iter()
            .filter(|other| **other != role)
            .filter_map(|other| self.dir(*other))
            .filter(|dir| **dir != path)
            .cloned()
            .collect();
        exclude.extend(self.exclude_dirs.iter().cloned());

        Some(TemplateDir {
            path,
            ext: self.extension(),
            strip_ext: self.strip_ext,
            exclude,
        })
    }

    /// Engine settings: delimiters and parsed options
    pub fn engine_options(&self) -> Result<EngineOptions, ConfigError> {
        let delimiters = Delimiters::new(
            self.left_delim.as_deref().unwrap_or_default(),
            self.right_delim.as_deref().unwrap_or_default(),
        );
        self.options
            .iter()
            .try_fold(EngineOptions::new().with_delimiters(delimiters), |opts, option| {
                opts.with_option(option)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MissingKey;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
layouts_dir = "layouts"
views_dir = "views"
partials_dir = "views/partials"
template_ext = "tmpl"
strip_ext = true
left_delim = "[["
right_delim = "]]"
options = ["missingkey=error"]
default_layout = "main"
cache_mode = "none"
"#;
        let config = ComposerConfig::from_toml(toml_str).expect("Should parse");
        assert_eq!(config.layouts_dir, Some(PathBuf::from("layouts")));
        assert_eq!(config.extension().as_deref(), Some(".tmpl"));
        assert!(config.strip_ext);
        assert_eq!(config.default_layout.as_deref(), Some("main"));
        assert_eq!(config.cache_mode, CacheMode::None);

        let opts = config.engine_options().expect("Valid options");
        assert_eq!(opts.delimiters, Delimiters::new("[[", "]]"));
        assert_eq!(opts.missing_key, MissingKey::Error);
    }

    #[test]
    fn test_defaults() {
        let config = ComposerConfig::from_toml("").expect("Should parse");
        assert_eq!(config, ComposerConfig::default());
        assert_eq!(config.cache_mode, CacheMode::PreloadOnce);
        assert_eq!(config.extension(), None);
        assert!(config.template_dir(TemplateRole::Views).is_none());
        assert_eq!(
            config.engine_options().expect("Valid options"),
            EngineOptions::default()
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = ComposerConfig::from_toml("layout_dir = \"oops\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_invalid_option_rejected() {
        let config = ComposerConfig::new().with_option("missingkey=sometimes");
        assert!(matches!(
            config.engine_options(),
            Err(ConfigError::InvalidOption { option }) if option == "missingkey=sometimes"
        ));
    }

    #[test]
    fn test_template_dir_excludes_other_dirs() {
        let config = ComposerConfig::new()
            .with_views_dir("site")
            .with_partials_dir("site/partials")
            .with_exclude_dir("site/drafts")
            .with_template_ext(".html");

        let views = config.template_dir(TemplateRole::Views).expect("Configured");
        assert_eq!(views.path, PathBuf::from("site"));
        assert_eq!(
            views.exclude,
            vec![PathBuf::from("site/partials"), PathBuf::from("site/drafts")]
        );
        assert_eq!(views.ext.as_deref(), Some(".html"));

        let partials = config.template_dir(TemplateRole::Partials).expect("Configured");
        assert_eq!(
            partials.exclude,
            vec![PathBuf::from("site"), PathBuf::from("site/drafts")]
        );
    }

    #[test]
    fn test_paths_resolve_against_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("composer.toml");
        std::fs::write(&path, "views_dir = \"views\"\nexclude_dirs = [\"/abs\"]\n").expect("write");

        let config = ComposerConfig::from_file(&path).expect("Should load");
        let views = config.template_dir(TemplateRole::Views).expect("Configured");
        assert_eq!(views.path, dir.path().join("views"));
        assert_eq!(views.exclude, vec![PathBuf::from("/abs")]);
    }

    #[test]
    fn test_builder_dirs_not_rebased_onto_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("conf/composer.toml");
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "layouts_dir = \"layouts\"\n").expect("write");

        let config = ComposerConfig::from_file(&path)
            .expect("Should load")
            .with_views_dir("views");

        let views = config.template_dir(TemplateRole::Views).expect("Configured");
        assert_eq!(views.path, PathBuf::from("views"));
        assert_eq!(views.exclude, vec![dir.path().join("conf/layouts")]);
    }
}
