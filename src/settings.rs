use crate::context::Context;
use crate::error::Error;
use crate::platform::Platform;
use crate::result::Result;
use crate::tpl::Tpl;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Settings file picked up from the working directory when none is given
pub const DEFAULT_SETTINGS_FILE: &str = "postbuild.toml";

const DEFAULT_POD_WAIT_MS: u64 = 2000;

#[derive(Debug, Deserialize, Serialize)]
pub struct SettingsToml {
    #[serde(default)]
    pub postbuild: Option<PostbuildConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct PostbuildConfig {
    #[serde(default)]
    pub archive: bool,

    #[serde(default)]
    pub pods: bool,

    #[serde(default)]
    pub pod_wait_ms: Option<u64>,

    #[serde(default)]
    pub shell: Option<String>,

    #[serde(default)]
    pub commands: Vec<String>,
}

/// Resolved post-build settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub archive: bool,
    pub pods: bool,
    pub pod_wait: Duration,
    pub shell: Option<String>,
    pub commands: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(PostbuildConfig::default())
    }
}

impl Settings {
    /// Load settings from `path`, or from `postbuild.toml` in the base
    /// directory when present, falling back to defaults
    pub fn load(ctx: &Context, path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let path = ctx.base_dir.join(path);
                let config = Self::read(&path)?.ok_or_else(|| {
                    Error::InvalidConfig(format!(
                        "Missing [postbuild] section in {}",
                        path.display()
                    ))
                })?;
                Ok(Self::from_config(config))
            }
            None => {
                let path = ctx.base_dir.join(DEFAULT_SETTINGS_FILE);
                if !path.exists() {
                    return Ok(Self::default());
                }
                let config = Self::read(&path)?.unwrap_or_default();
                Ok(Self::from_config(config))
            }
        }
    }

    /// Parse settings from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let settings: SettingsToml = toml::from_str(content)?;
        Ok(Self::from_config(settings.postbuild.unwrap_or_default()))
    }

    fn read(path: &Path) -> Result<Option<PostbuildConfig>> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let settings: SettingsToml = toml::from_str(&content)?;
        Ok(settings.postbuild)
    }

    fn from_config(config: PostbuildConfig) -> Self {
        Self {
            archive: config.archive,
            pods: config.pods,
            pod_wait: Duration::from_millis(config.pod_wait_ms.unwrap_or(DEFAULT_POD_WAIT_MS)),
            shell: config.shell.filter(|s| !s.trim().is_empty()),
            commands: config
                .commands
                .into_iter()
                .filter(|c| !c.trim().is_empty())
                .collect(),
        }
    }

    /// Whether any post-build step is enabled
    pub fn has_steps(&self) -> bool {
        self.archive || self.pods || !self.commands.is_empty()
    }

    /// Commands with `$BUILD_PATH`, `$BUILD_NAME` and `$PLATFORM` resolved
    pub fn resolve_commands(&self, build_path: &Path, build_name: &str) -> Vec<String> {
        let mut tpl = Tpl::new();
        tpl.register("BUILD_PATH", build_path.display().to_string());
        tpl.register("BUILD_NAME", build_name);
        tpl.register("PLATFORM", Platform::current().as_str());

        tpl.parse_vec(&self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::parse("").unwrap();

        assert_eq!(settings, Settings::default());
        assert!(!settings.archive);
        assert!(!settings.pods);
        assert_eq!(settings.pod_wait, Duration::from_millis(2000));
        assert!(settings.commands.is_empty());
    }

    #[test]
    fn test_parse_full() {
        let settings = Settings::parse(
            r#"
            [postbuild]
            archive = true
            pods = true
            pod-wait-ms = 500
            shell = "/bin/bash"
            commands = ["ls $BUILD_PATH", "  "]
            "#,
        )
        .unwrap();

        assert!(settings.archive);
        assert!(settings.pods);
        assert_eq!(settings.pod_wait, Duration::from_millis(500));
        assert_eq!(settings.shell.as_deref(), Some("/bin/bash"));
        assert_eq!(settings.commands, ["ls $BUILD_PATH"]);
    }

    #[test]
    fn test_has_steps() {
        assert!(!Settings::default().has_steps());
        assert!(Settings { pods: true, ..Settings::default() }.has_steps());
        assert!(Settings::parse("[postbuild]\ncommands = [\"true\"]\n").unwrap().has_steps());
    }

    #[test]
    fn test_malformed() {
        let err = Settings::parse("[postbuild\narchive = ").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_resolve_commands() {
        let settings = Settings {
            commands: vec!["cp $BUILD_PATH /tmp/$BUILD_NAME-$PLATFORM".to_string()],
            ..Settings::default()
        };

        let commands = settings.resolve_commands(Path::new("/out/Game.app"), "Game.app");

        assert_eq!(
            commands,
            [format!(
                "cp /out/Game.app /tmp/Game.app-{}",
                Platform::current().as_str()
            )]
        );
    }

    #[test]
    fn test_load_default_file() {
        let tmp = tempdir().unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), false);

        assert_eq!(Settings::load(&ctx, None).unwrap(), Settings::default());

        fs::write(
            tmp.path().join(DEFAULT_SETTINGS_FILE),
            "[postbuild]\narchive = true\n",
        )
        .unwrap();
        assert!(Settings::load(&ctx, None).unwrap().archive);
    }

    #[test]
    fn test_load_explicit_without_section() {
        let tmp = tempdir().unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), false);
        fs::write(tmp.path().join("other.toml"), "[package]\nname = \"x\"\n").unwrap();

        let err = Settings::load(&ctx, Some(Path::new("other.toml"))).unwrap_err();

        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let tmp = tempdir().unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), false);

        let err = Settings::load(&ctx, Some(Path::new("absent.toml"))).unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
    }
}
