//! Renders post templates and writes the results to disk. Post templates are
//! [`gtmpl`] templates with two extra functions available:
//!
//! * `highlight_block CODE [LANGUAGE]` returns `CODE` as inline-styled HTML
//!   (see [`crate::highlight`]).
//! * `source_branch_graph SECTION` returns the pre-generated branch graph for
//!   `SECTION` (see [`crate::graph`]).
//!
//! Template functions are plain function pointers, so the highlighter and the
//! graph directory they rely on are installed in thread-local storage for the
//! duration of each render.

use crate::graph;
use crate::highlight::Highlighter;
use gtmpl::{Context, Template};
use gtmpl_value::{FuncError, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Everything the template functions need while a post is rendering.
struct RenderServices {
    highlighter: Highlighter,
    graph_directory: PathBuf,
}

thread_local! {
    static SERVICES: RefCell<Option<RenderServices>> = RefCell::new(None);
}

/// Puts back the previously installed services when dropped, including when
/// a render unwinds.
struct RestoreServices(Option<RenderServices>);

impl Drop for RestoreServices {
    fn drop(&mut self) {
        let previous = self.0.take();
        SERVICES.with(|s| s.replace(previous));
    }
}

/// Installs `services` for the current thread, runs `f`, and then restores
/// whatever was installed before.
fn with_services<T>(services: RenderServices, f: impl FnOnce() -> T) -> T {
    let _restore = RestoreServices(SERVICES.with(|s| s.replace(Some(services))));
    f()
}

fn using_services(
    name: &str,
    f: impl FnOnce(&RenderServices) -> std::result::Result<Value, FuncError>,
) -> std::result::Result<Value, FuncError> {
    SERVICES.with(|s| match &*s.borrow() {
        Some(services) => f(services),
        None => Err(FuncError::Generic(format!(
            "{} called outside of a post render",
            name
        ))),
    })
}

fn string_arg<'v>(name: &str, value: &'v Value) -> std::result::Result<&'v str, FuncError> {
    match value {
        Value::String(s) => Ok(s.as_str()),
        _ => Err(FuncError::Generic(format!(
            "{} expects string arguments",
            name
        ))),
    }
}

/// The `highlight_block` template function.
fn highlight_block(args: &[Value]) -> std::result::Result<Value, FuncError> {
    const NAME: &str = "highlight_block";
    let (code, language) = match args {
        [code] => (string_arg(NAME, code)?, None),
        [code, language] => (string_arg(NAME, code)?, Some(string_arg(NAME, language)?)),
        _ => {
            return Err(FuncError::Generic(format!(
                "{} takes 1 or 2 arguments, got {}",
                NAME,
                args.len()
            )))
        }
    };
    using_services(NAME, |services| {
        services
            .highlighter
            .highlight(code, language)
            .map(Value::String)
            .map_err(|e| FuncError::Generic(e.to_string()))
    })
}

/// The `source_branch_graph` template function.
fn source_branch_graph(args: &[Value]) -> std::result::Result<Value, FuncError> {
    const NAME: &str = "source_branch_graph";
    let section = match args {
        [section] => string_arg(NAME, section)?,
        _ => {
            return Err(FuncError::Generic(format!(
                "{} takes 1 argument, got {}",
                NAME,
                args.len()
            )))
        }
    };
    using_services(NAME, |services| {
        graph::read_branch_graph(&services.graph_directory, section)
            .map(Value::String)
            .map_err(|e| FuncError::Generic(e.to_string()))
    })
}

/// Renders post templates and writes them to disk.
pub struct Writer<'a> {
    /// The concatenated partial templates. These are prepended to every post
    /// template so their `define` blocks are available to it.
    pub partials: &'a str,

    /// Backs the `highlight_block` template function.
    pub highlighter: &'a Highlighter,

    /// The directory `source_branch_graph` reads from.
    pub graph_directory: &'a Path,
}

impl Writer<'_> {
    /// Parses a post template from its source, with the partials and the
    /// template functions available.
    pub fn parse_template(&self, source: &str) -> Result<Template> {
        let mut template = Template::default();
        template.add_func("highlight_block", highlight_block);
        template.add_func("source_branch_graph", source_branch_graph);

        let mut contents = String::with_capacity(self.partials.len() + source.len() + 1);
        contents.push_str(self.partials);
        contents.push(' ');
        contents.push_str(source);
        template
            .parse(&contents)
            .map_err(|e| Error::ParseTemplate(e.to_string()))?;
        Ok(template)
    }

    /// Renders a post template with `current_tag` in its context and trims
    /// the surrounding whitespace from the result.
    pub fn render(&self, source: &str, current_tag: &str) -> Result<String> {
        let template = self.parse_template(source)?;

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "current_tag".to_owned(),
            Value::String(current_tag.to_owned()),
        );
        let context = Context::from(Value::Object(m));

        let services = RenderServices {
            highlighter: self.highlighter.clone(),
            graph_directory: self.graph_directory.to_owned(),
        };
        let rendered = with_services(services, || template.render(&context))
            .map_err(|e| Error::Template(e.to_string()))?;
        Ok(rendered.trim().to_owned())
    }

    /// Writes a compiled post to `file_path`, replacing any existing file.
    pub fn write_post(&self, file_path: &Path, contents: &str) -> Result<()> {
        use std::io::Write;
        File::create(file_path)
            .and_then(|mut file| file.write_all(contents.as_bytes()))
            .map_err(|err| Error::WriteFile {
                path: file_path.to_owned(),
                err,
            })
    }
}

/// The result of a fallible rendering or writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error rendering or writing a post.
#[derive(Debug)]
pub enum Error {
    /// An error parsing a template.
    ParseTemplate(String),

    /// An error during templating, including errors raised by the template
    /// functions.
    Template(String),

    /// An error writing an output file.
    WriteFile { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseTemplate(err) => write!(f, "Parsing template: {}", err),
            Error::Template(err) => err.fmt(f),
            Error::WriteFile { path, err } => {
                write!(f, "Writing file '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ParseTemplate(_) => None,
            Error::Template(_) => None,
            Error::WriteFile { path: _, err } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn render(partials: &str, source: &str, graphs: &Path) -> Result<String> {
        let highlighter = Highlighter::default();
        let writer = Writer {
            partials,
            highlighter: &highlighter,
            graph_directory: graphs,
        };
        writer.render(source, "post-test")
    }

    #[test]
    fn test_render_current_tag() -> Result<()> {
        let rendered = render("", "\n\nTag: {{.current_tag}}\n\n", Path::new("."))?;
        assert_eq!("Tag: post-test", rendered);
        Ok(())
    }

    #[test]
    fn test_render_partial() -> Result<()> {
        let rendered = render(
            r#"{{define "footer"}}-- {{.current_tag}}{{end}}"#,
            r#"Body {{template "footer" .}}"#,
            Path::new("."),
        )?;
        assert_eq!("Body -- post-test", rendered);
        Ok(())
    }

    #[test]
    fn test_render_highlight_block() -> Result<()> {
        let rendered = render(
            "",
            r#"{{highlight_block "let x = 1;" "rust"}}"#,
            Path::new("."),
        )?;
        assert!(rendered.starts_with("<pre style=\""));
        assert!(rendered.contains("<span style="));
        Ok(())
    }

    #[test]
    fn test_render_branch_graph() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("rebase.html"), "<pre>graph</pre>")?;
        let rendered = render("", r#"{{source_branch_graph "rebase"}}"#, dir.path())?;
        assert_eq!("<pre>graph</pre>", rendered);
        Ok(())
    }

    #[test]
    fn test_render_missing_branch_graph() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        match render("", r#"{{source_branch_graph "nope"}}"#, dir.path()) {
            Err(Error::Template(_)) => {}
            other => panic!("wanted a template error, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_parse_error() {
        match render("", "{{if}}", Path::new(".")) {
            Err(Error::ParseTemplate(_)) => {}
            other => panic!("wanted a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_services_are_removed_after_render() -> Result<()> {
        render("", "x", Path::new("."))?;
        assert!(source_branch_graph(&[Value::String("x".to_owned())]).is_err());
        Ok(())
    }

    fn assert_template_error(source: &str) {
        match render("", source, Path::new(".")) {
            Err(Error::Template(_)) => {}
            other => panic!("wanted a template error for `{}`, got {:?}", source, other),
        }
    }

    #[test]
    fn test_highlight_block_argument_count() {
        assert_template_error("{{highlight_block}}");
        assert_template_error(r#"{{highlight_block "a" "b" "c"}}"#);
    }

    #[test]
    fn test_highlight_block_non_string_argument() {
        assert_template_error("{{highlight_block 1}}");
        assert_template_error(r#"{{highlight_block "a" 2}}"#);
    }

    #[test]
    fn test_source_branch_graph_arguments() {
        assert_template_error("{{source_branch_graph}}");
        assert_template_error(r#"{{source_branch_graph "a" "b"}}"#);
        assert_template_error("{{source_branch_graph 3}}");
    }

    #[test]
    fn test_services_are_restored_after_panic() {
        let highlighter = Highlighter::default();
        let result = std::panic::catch_unwind(|| {
            let services = RenderServices {
                highlighter: highlighter.clone(),
                graph_directory: PathBuf::from("."),
            };
            with_services(services, || panic!("render failed"))
        });
        assert!(result.is_err());
        assert!(SERVICES.with(|s| s.borrow().is_none()));
    }

    #[test]
    fn test_write_post() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let highlighter = Highlighter::default();
        let writer = Writer {
            partials: "",
            highlighter: &highlighter,
            graph_directory: dir.path(),
        };
        let path = dir.path().join("post-a.md");
        writer.write_post(&path, "contents").unwrap();
        assert_eq!("contents", std::fs::read_to_string(&path)?);
        Ok(())
    }
}
