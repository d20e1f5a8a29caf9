//! Exports the [`build_posts`] function which stitches together the steps of
//! compiling every post template: cleaning the build directory, discovering
//! the templates and partials, and then, for each post, rendering it
//! ([`crate::write`]), inserting its table of contents ([`crate::toc`]),
//! collapsing extra whitespace ([`crate::whitespace`]), and writing the
//! result.

use crate::config::Config;
use crate::highlight::{Error as HighlightError, Highlighter};
use crate::toc::build_post_toc;
use crate::whitespace::strip_extra_whitespace;
use crate::write::{Error as WriteError, Writer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Compiles every post template named by `config` into its build directory
/// and returns the paths of the written files, in template order. The build
/// directory is deleted and recreated first. The first failing post aborts
/// the build.
pub fn build_posts(config: &Config) -> Result<Vec<PathBuf>> {
    let highlighter = Highlighter::new(&config.highlight_theme)?;

    // Blow away the old output so posts whose templates were removed don't
    // linger.
    rmdir(&config.build_directory)?;
    std::fs::create_dir_all(&config.build_directory).map_err(|err| Error::CreateDir {
        path: config.build_directory.clone(),
        err,
    })?;
    log::info!("cleaned build directory `{}`", config.build_directory.display());

    let posts = find_post_templates(&config.template_directory, &config.post_pattern)?;
    log::debug!("found {} post templates", posts.len());
    let partials = load_partials(
        &config.template_directory,
        &config.template_extension,
        &config.post_pattern,
        None,
    )?;

    let writer = Writer {
        partials: &partials,
        highlighter: &highlighter,
        graph_directory: &config.graph_directory,
    };
    posts
        .iter()
        .map(|template_path| compile_post(&writer, config, template_path))
        .collect()
}

/// Compiles a single template without touching the build directory and
/// returns the compiled text.
pub fn render_post(config: &Config, template_path: &Path) -> Result<String> {
    let highlighter = Highlighter::new(&config.highlight_theme)?;
    let partials = load_partials(
        &config.template_directory,
        &config.template_extension,
        &config.post_pattern,
        Some(template_path),
    )?;
    let writer = Writer {
        partials: &partials,
        highlighter: &highlighter,
        graph_directory: &config.graph_directory,
    };
    let file_name = file_name(template_path)?;
    let source = read_template(template_path)?;
    compile_source(&writer, &source, &current_tag(file_name, &config.template_extension))
        .map_err(|e| annotate(template_path, e))
}

/// Runs the compile pipeline over one template's source: render, insert the
/// table of contents, collapse whitespace.
pub fn compile_source(writer: &Writer, source: &str, current_tag: &str) -> Result<String> {
    let rendered = writer.render(source, current_tag)?;
    Ok(strip_extra_whitespace(&build_post_toc(&rendered)))
}

/// Compiles the template at `template_path` and writes it to the build
/// directory. Returns the path of the written file.
pub fn compile_post(writer: &Writer, config: &Config, template_path: &Path) -> Result<PathBuf> {
    let compile = || -> Result<PathBuf> {
        let file_name = file_name(template_path)?;
        let source = read_template(template_path)?;
        let compiled = compile_source(
            writer,
            &source,
            &current_tag(file_name, &config.template_extension),
        )?;
        let output_path = config
            .build_directory
            .join(output_name(file_name, &config.template_extension));
        writer.write_post(&output_path, &compiled)?;
        log::info!("wrote `{}`", output_path.display());
        Ok(output_path)
    };
    compile().map_err(|e| annotate(template_path, e))
}

/// The value of `current_tag` for a template: the file name less the template
/// extension and any `.md`, so `post-rebase.md.j2` becomes `post-rebase`.
pub fn current_tag(file_name: &str, template_extension: &str) -> String {
    output_name(file_name, template_extension).replace(".md", "")
}

/// The output file name for a template: the file name less the template
/// extension.
pub fn output_name<'a>(file_name: &'a str, template_extension: &str) -> &'a str {
    file_name
        .strip_suffix(template_extension)
        .unwrap_or(file_name)
}

/// Returns the templates in `template_directory` whose names match
/// `post_pattern`, sorted by path.
pub fn find_post_templates(template_directory: &Path, post_pattern: &str) -> Result<Vec<PathBuf>> {
    let directory = template_directory
        .to_str()
        .ok_or_else(|| Error::InvalidFileName(template_directory.to_owned()))?;
    let pattern = format!("{}/{}", glob::Pattern::escape(directory), post_pattern);

    let mut posts = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        if path.is_file() {
            posts.push(path);
        }
    }
    posts.sort();
    Ok(posts)
}

/// Loads every template under `template_directory` and concatenates them,
/// sorted by path, skipping anything whose file name matches `post_pattern`
/// (at any depth, so drafts in subdirectories are skipped too) and
/// `exclude`, which is compared by canonical path. These are the partials
/// whose `define` blocks are shared by all posts; anything they render
/// outside of a `define` ends up at the top of every post.
pub fn load_partials(
    template_directory: &Path,
    template_extension: &str,
    post_pattern: &str,
    exclude: Option<&Path>,
) -> Result<String> {
    use walkdir::WalkDir;

    let post_pattern = glob::Pattern::new(post_pattern)?;
    let exclude = match exclude {
        Some(path) => Some(canonicalize(path)?),
        None => None,
    };

    let mut contents = String::new();
    for result in WalkDir::new(template_directory).sort_by_file_name() {
        let entry = result?;
        let is_template = entry.file_type().is_file()
            && entry.file_name().to_str().map_or(false, |name| {
                name.ends_with(template_extension) && !post_pattern.matches(name)
            });
        if !is_template {
            continue;
        }
        if let Some(exclude) = &exclude {
            if canonicalize(entry.path())? == *exclude {
                continue;
            }
        }
        log::debug!("loading partial `{}`", entry.path().display());
        contents.push_str(&read_template(entry.path())?);
        contents.push(' ');
    }
    Ok(contents)
}

fn canonicalize(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|err| Error::ReadTemplate {
        path: path.to_owned(),
        err,
    })
}

fn read_template(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| Error::ReadTemplate {
        path: path.to_owned(),
        err,
    })
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::InvalidFileName(path.to_owned()))
}

fn annotate(template_path: &Path, err: Error) -> Error {
    Error::Annotated(
        format!("compiling post `{}`", template_path.display()),
        Box::new(err),
    )
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

/// The result of a fallible build operation.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for compiling posts. Errors can come from cleaning the
/// build directory, discovering or reading templates, rendering, and writing.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while cleaning the build directory.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while recreating the build directory.
    CreateDir { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while reading a template file.
    ReadTemplate { path: PathBuf, err: std::io::Error },

    /// Returned when the post pattern isn't a valid glob.
    Pattern(glob::PatternError),

    /// Returned for I/O problems while matching the post pattern.
    Glob(glob::GlobError),

    /// Returned for I/O problems while walking the template directory.
    WalkDir(walkdir::Error),

    /// Returned when a template path isn't valid UTF-8.
    InvalidFileName(PathBuf),

    /// Returned when the highlighting theme can't be loaded.
    Highlight(HighlightError),

    /// Returned for errors rendering or writing a post.
    Write(WriteError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::CreateDir { path, err } => {
                write!(f, "Creating directory '{}': {}", path.display(), err)
            }
            Error::ReadTemplate { path, err } => {
                write!(f, "Reading template file '{}': {}", path.display(), err)
            }
            Error::Pattern(err) => write!(f, "Invalid post pattern: {}", err),
            Error::Glob(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(path) => write!(f, "invalid file name: {:?}", path),
            Error::Highlight(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Annotated(annotation, err) => write!(f, "{}: {}", annotation, err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Clean { path: _, err } => Some(err),
            Error::CreateDir { path: _, err } => Some(err),
            Error::ReadTemplate { path: _, err } => Some(err),
            Error::Pattern(err) => Some(err),
            Error::Glob(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(_) => None,
            Error::Highlight(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<glob::PatternError> for Error {
    /// Converts [`glob::PatternError`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: glob::PatternError) -> Error {
        Error::Pattern(err)
    }
}

impl From<glob::GlobError> for Error {
    /// Converts [`glob::GlobError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: glob::GlobError) -> Error {
        Error::Glob(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<HighlightError> for Error {
    /// Converts [`HighlightError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: HighlightError) -> Error {
        Error::Highlight(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}
