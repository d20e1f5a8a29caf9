use crate::highlight::DEFAULT_THEME;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The name of the optional project file.
pub const PROJECT_FILE: &str = "wotw.yaml";

/// The project file as it appears on disk. Every key is optional, and the
/// directories are relative to the project file.
#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct Project {
    template_directory: Option<PathBuf>,
    build_directory: Option<PathBuf>,
    graph_directory: Option<PathBuf>,
    post_pattern: Option<String>,
    template_extension: Option<String>,
    highlight_theme: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Holds the post templates and any partials.
    pub template_directory: PathBuf,

    /// Compiled posts are written here. The directory is deleted and
    /// recreated on every build.
    pub build_directory: PathBuf,

    /// Holds the `{section}.html` files read by `source_branch_graph`.
    pub graph_directory: PathBuf,

    /// The glob matched against file names in the template directory to find
    /// post templates.
    pub post_pattern: String,

    /// Stripped from a post template's file name to produce its output name.
    pub template_extension: String,

    /// The syntect theme for `highlight_block`.
    pub highlight_theme: String,
}

impl Config {
    /// The configuration for a project rooted at `root` with no project file.
    pub fn with_defaults(root: &Path) -> Config {
        Config::from_project(root, Project::default())
    }

    fn from_project(root: &Path, project: Project) -> Config {
        let resolve = |dir: Option<PathBuf>, default: &str| {
            root.join(dir.unwrap_or_else(|| PathBuf::from(default)))
        };
        Config {
            template_directory: resolve(project.template_directory, "templates"),
            build_directory: resolve(project.build_directory, "build"),
            graph_directory: resolve(project.graph_directory, "script-output"),
            post_pattern: project
                .post_pattern
                .unwrap_or_else(|| String::from("post-*.j2")),
            template_extension: project
                .template_extension
                .unwrap_or_else(|| String::from(".j2")),
            highlight_theme: project
                .highlight_theme
                .unwrap_or_else(|| String::from(DEFAULT_THEME)),
        }
    }

    /// Looks for [`PROJECT_FILE`] in `dir` and then in each of its parents.
    /// Falls back to [`Config::with_defaults`] for `dir` if no project file
    /// exists.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        for ancestor in dir.ancestors() {
            let path = ancestor.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path)
                    .with_context(|| format!("Loading configuration from `{}`", path.display()));
            }
        }
        log::debug!(
            "no `{}` found above `{}`; using defaults",
            PROJECT_FILE,
            dir.display()
        );
        Ok(Config::with_defaults(dir))
    }

    pub fn from_project_file(path: &Path) -> Result<Config> {
        use crate::util::open;
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => Ok(Config::from_project(project_root, project)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = Config::with_defaults(Path::new("/blog/posts"));
        assert_eq!(PathBuf::from("/blog/posts/templates"), config.template_directory);
        assert_eq!(PathBuf::from("/blog/posts/build"), config.build_directory);
        assert_eq!(PathBuf::from("/blog/posts/script-output"), config.graph_directory);
        assert_eq!("post-*.j2", config.post_pattern);
        assert_eq!(".j2", config.template_extension);
        assert_eq!(DEFAULT_THEME, config.highlight_theme);
    }

    #[test]
    fn test_from_directory_searches_parents() -> Result<()> {
        let root = tempfile::tempdir()?;
        fs::write(
            root.path().join(PROJECT_FILE),
            "build_directory: out\nhighlight_theme: base16-ocean.dark\n",
        )?;
        let nested = root.path().join("a").join("b");
        fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested)?;
        assert_eq!(root.path().join("out"), config.build_directory);
        assert_eq!(root.path().join("templates"), config.template_directory);
        assert_eq!("base16-ocean.dark", config.highlight_theme);
        Ok(())
    }

    #[test]
    fn test_from_directory_without_project_file() -> Result<()> {
        let root = tempfile::tempdir()?;
        let config = Config::from_directory(root.path())?;
        assert_eq!(Config::with_defaults(root.path()), config);
        Ok(())
    }

    #[test]
    fn test_unknown_key_is_rejected() -> Result<()> {
        let root = tempfile::tempdir()?;
        let path = root.path().join(PROJECT_FILE);
        fs::write(&path, "bulid_directory: typo\n")?;
        assert!(Config::from_project_file(&path).is_err());
        Ok(())
    }
}
