use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SqlalignError;
use crate::mode::{FormatMode, Mode};

const CONFIG_FILE_NAME: &str = "sqlalign.toml";
const PYPROJECT_FILE_NAME: &str = "pyproject.toml";

/// Options accepted in `sqlalign.toml` or under `[tool.sqlalign]`.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub mode: Option<FormatMode>,
    #[serde(alias = "max-nesting-depth")]
    pub max_nesting_depth: Option<usize>,
    pub exclude: Option<Vec<String>>,
}

/// Load sqlalign configuration for the given inputs.
///
/// An explicit `config_path` must exist. Otherwise the parents of the
/// inputs are searched for `sqlalign.toml`, then for a `pyproject.toml`
/// with a `[tool.sqlalign]` table, and finally the user config directory
/// is tried.
pub fn load_config(files: &[PathBuf], config_path: Option<&Path>) -> Result<Mode, SqlalignError> {
    let mut mode = Mode::default();

    let config = match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(SqlalignError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            load_config_from_path(path)?
        }
        None => match find_config(files)? {
            Some((path, config)) => {
                tracing::debug!(path = %path.display(), "using config file");
                Some(config)
            }
            None => None,
        },
    };

    if let Some(config) = config {
        apply_config(&mut mode, config)?;
    }
    Ok(mode)
}

/// Search the parents of the inputs, then the user config directory.
fn find_config(files: &[PathBuf]) -> Result<Option<(PathBuf, FileConfig)>, SqlalignError> {
    let user_config = dirs::config_dir().map(|dir| dir.join("sqlalign").join(CONFIG_FILE_NAME));
    let candidates = get_common_parents(files)
        .into_iter()
        .flat_map(|dir| [dir.join(CONFIG_FILE_NAME), dir.join(PYPROJECT_FILE_NAME)])
        .chain(user_config);

    for path in candidates {
        if !path.is_file() {
            continue;
        }
        if let Some(config) = load_config_from_path(&path)? {
            return Ok(Some((path, config)));
        }
    }
    Ok(None)
}

/// Get the parent directories of the given file paths, ordered from most
/// specific to least specific.
fn get_common_parents(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut parents = Vec::new();

    for file in files {
        let parent = if file.is_dir() {
            file.clone()
        } else {
            file.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        };
        let parent = parent.canonicalize().unwrap_or(parent);

        let mut current = Some(parent.as_path());
        while let Some(dir) = current {
            let dir_buf = dir.to_path_buf();
            if !parents.contains(&dir_buf) {
                parents.push(dir_buf);
            }
            current = dir.parent();
        }
    }

    parents
}

/// Load one config file. A `pyproject.toml` without a `[tool.sqlalign]`
/// table yields `None`.
fn load_config_from_path(path: &Path) -> Result<Option<FileConfig>, SqlalignError> {
    let content = std::fs::read_to_string(path)?;
    let is_pyproject = path
        .file_name()
        .is_some_and(|name| name == PYPROJECT_FILE_NAME);

    if !is_pyproject {
        return toml::from_str(&content).map(Some).map_err(|e| {
            SqlalignError::Config(format!("Failed to parse {}: {}", path.display(), e))
        });
    }

    let parsed: toml::Table = toml::from_str(&content)?;
    match parsed.get("tool").and_then(|tool| tool.get("sqlalign")) {
        Some(section) => section.clone().try_into().map(Some).map_err(|e| {
            SqlalignError::Config(format!(
                "Invalid [tool.sqlalign] in {}: {}",
                path.display(),
                e
            ))
        }),
        None => Ok(None),
    }
}

/// Apply configuration values to a Mode.
fn apply_config(mode: &mut Mode, config: FileConfig) -> Result<(), SqlalignError> {
    if let Some(format_mode) = config.mode {
        mode.format_mode = format_mode;
    }
    if let Some(depth) = config.max_nesting_depth {
        if depth == 0 {
            return Err(SqlalignError::Config(
                "max_nesting_depth must be at least 1".to_string(),
            ));
        }
        mode.max_nesting_depth = depth;
    }
    if let Some(exclude) = config.exclude {
        mode.exclude = exclude;
    }
    Ok(())
}
