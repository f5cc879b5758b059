//! Startup-time template compilation and lookup.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::parser::{self, Node, ParseError};
use super::{CompiledPage, Segment};

/// Partials may include other partials; anything deeper than this is
/// treated as a reference cycle.
const MAX_INCLUDE_DEPTH: usize = 16;

/// The reserved include name the base layout uses for the page body.
const PAGE_BODY_SLOT: &str = "main";

/// Errors produced while building the registry. Any of these is fatal at
/// startup; a partially populated registry is never exposed.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("unknown partial '{{{{> {name}}}}}' in {}", path.display())]
    UnknownPartial { name: String, path: PathBuf },

    #[error("include depth exceeded resolving '{{{{> {name}}}}}' in {}", path.display())]
    IncludeDepth { name: String, path: PathBuf },
}

/// Immutable mapping of page name to compiled template set.
///
/// Built once before the server accepts traffic; performs no filesystem
/// access afterwards and needs no synchronization for concurrent reads.
#[derive(Debug)]
pub struct TemplateRegistry {
    pages: HashMap<String, CompiledPage>,
}

impl TemplateRegistry {
    /// Compile every `*.tmpl` page under `pages_dir` together with the base
    /// layout and all `*.tmpl` partials under `partials_dir`.
    ///
    /// The page name is the file name of the page source (`home.tmpl`).
    /// Aborts on the first page that fails to read, parse, or link.
    pub fn build(
        pages_dir: &Path,
        base_path: &Path,
        partials_dir: &Path,
    ) -> Result<Self, BuildError> {
        let base = parse_file(base_path)?;

        let mut partials = HashMap::new();
        for path in template_files(partials_dir)? {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            partials.insert(name, parse_file(&path)?);
        }

        let mut pages = HashMap::new();
        for path in template_files(pages_dir)? {
            let name = path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let body = parse_file(&path)?;
            let segments = link(&base, &partials, &body, 0, &path)?;

            tracing::debug!(page = %name, "Page template compiled");
            pages.insert(name, CompiledPage::new(segments));
        }

        Ok(Self { pages })
    }

    /// Look up a compiled page by name.
    pub fn get(&self, name: &str) -> Option<&CompiledPage> {
        self.pages.get(name)
    }

    /// Registered page names, sorted.
    pub fn page_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn parse_file(path: &Path) -> Result<Vec<Node>, BuildError> {
    let source = fs::read_to_string(path).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parser::parse(&source).map_err(|source| BuildError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn template_files(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let entries = fs::read_dir(dir).map_err(|source| BuildError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| BuildError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "tmpl") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Resolve a node tree into executable segments, splicing the page body in
/// for `{{> main}}` and partial bodies in for every other include.
fn link(
    nodes: &[Node],
    partials: &HashMap<String, Vec<Node>>,
    page_body: &[Node],
    depth: usize,
    page_path: &Path,
) -> Result<Vec<Segment>, BuildError> {
    let mut segments = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(text) => segments.push(Segment::Text(text.clone())),
            Node::Variable(path) => segments.push(Segment::Variable(path.clone())),
            Node::Each { path, body } => segments.push(Segment::Each {
                path: path.clone(),
                body: link(body, partials, page_body, depth, page_path)?,
            }),
            Node::If {
                path,
                then_body,
                else_body,
            } => segments.push(Segment::If {
                path: path.clone(),
                then_body: link(then_body, partials, page_body, depth, page_path)?,
                else_body: link(else_body, partials, page_body, depth, page_path)?,
            }),
            Node::Include(name) => {
                if depth >= MAX_INCLUDE_DEPTH {
                    return Err(BuildError::IncludeDepth {
                        name: name.clone(),
                        path: page_path.to_path_buf(),
                    });
                }
                let included = if name == PAGE_BODY_SLOT {
                    page_body
                } else {
                    partials
                        .get(name)
                        .ok_or_else(|| BuildError::UnknownPartial {
                            name: name.clone(),
                            path: page_path.to_path_buf(),
                        })?
                };
                segments.extend(link(included, partials, page_body, depth + 1, page_path)?);
            }
        }
    }
    Ok(segments)
}

#[cfg(test)]
pub(crate) fn link_for_tests(nodes: &[Node]) -> Vec<Segment> {
    link(nodes, &HashMap::new(), &[], 0, Path::new("<test>")).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _root: TempDir,
        pages: PathBuf,
        base: PathBuf,
        partials: PathBuf,
    }

    fn fixture() -> Fixture {
        let root = TempDir::new().unwrap();
        let pages = root.path().join("pages");
        let partials = root.path().join("partials");
        fs::create_dir(&pages).unwrap();
        fs::create_dir(&partials).unwrap();

        let base = root.path().join("base.tmpl");
        fs::write(&base, "<html>{{> nav}}<main>{{> main}}</main></html>").unwrap();
        fs::write(partials.join("nav.tmpl"), "<nav>{{title}}</nav>").unwrap();

        Fixture {
            _root: root,
            pages,
            base,
            partials,
        }
    }

    fn build(f: &Fixture) -> Result<TemplateRegistry, BuildError> {
        TemplateRegistry::build(&f.pages, &f.base, &f.partials)
    }

    #[test]
    fn test_build_registers_every_page() {
        let f = fixture();
        fs::write(f.pages.join("home.tmpl"), "<h2>Home</h2>").unwrap();
        fs::write(f.pages.join("view.tmpl"), "<h2>View</h2>").unwrap();

        let registry = build(&f).unwrap();
        assert_eq!(registry.page_names(), vec!["home.tmpl", "view.tmpl"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_build_ignores_non_template_files() {
        let f = fixture();
        fs::write(f.pages.join("home.tmpl"), "x").unwrap();
        fs::write(f.pages.join("notes.txt"), "not a template").unwrap();

        let registry = build(&f).unwrap();
        assert_eq!(registry.page_names(), vec!["home.tmpl"]);
    }

    #[test]
    fn test_compiled_page_composes_base_partials_and_body() {
        let f = fixture();
        fs::write(f.pages.join("home.tmpl"), "<h2>{{heading}}</h2>").unwrap();

        let registry = build(&f).unwrap();
        let page = registry.get("home.tmpl").unwrap();
        let out = page
            .render(&json!({ "title": "Snippets", "heading": "Latest" }))
            .unwrap();
        assert_eq!(
            out,
            "<html><nav>Snippets</nav><main><h2>Latest</h2></main></html>"
        );
    }

    #[test]
    fn test_build_fails_fast_on_bad_page() {
        let f = fixture();
        fs::write(f.pages.join("home.tmpl"), "fine").unwrap();
        fs::write(f.pages.join("view.tmpl"), "{{#each items}}unclosed").unwrap();

        let err = build(&f).unwrap_err();
        assert!(matches!(err, BuildError::Parse { .. }));
    }

    #[test]
    fn test_build_fails_on_unknown_partial() {
        let f = fixture();
        fs::write(f.pages.join("home.tmpl"), "{{> sidebar}}").unwrap();

        let err = build(&f).unwrap_err();
        match err {
            BuildError::UnknownPartial { name, .. } => assert_eq!(name, "sidebar"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_build_fails_on_missing_base_layout() {
        let f = fixture();
        fs::write(f.pages.join("home.tmpl"), "x").unwrap();
        let err = TemplateRegistry::build(&f.pages, Path::new("/nonexistent.tmpl"), &f.partials)
            .unwrap_err();
        assert!(matches!(err, BuildError::Io { .. }));
    }

    #[test]
    fn test_partials_can_include_partials() {
        let f = fixture();
        fs::write(
            f.partials.join("footer.tmpl"),
            "<footer>{{> copyright}}</footer>",
        )
        .unwrap();
        fs::write(f.partials.join("copyright.tmpl"), "(c) {{year}}").unwrap();
        fs::write(f.pages.join("home.tmpl"), "{{> footer}}").unwrap();

        let registry = build(&f).unwrap();
        let out = registry
            .get("home.tmpl")
            .unwrap()
            .render(&json!({ "title": "t", "year": 2026 }))
            .unwrap();
        assert!(out.contains("<footer>(c) 2026</footer>"));
    }

    #[test]
    fn test_build_rejects_partial_cycle() {
        let f = fixture();
        fs::write(f.partials.join("loop.tmpl"), "{{> loop}}").unwrap();
        fs::write(f.pages.join("home.tmpl"), "{{> loop}}").unwrap();

        let err = build(&f).unwrap_err();
        assert!(matches!(err, BuildError::IncludeDepth { .. }));
    }

    #[test]
    fn test_empty_pages_dir_builds_empty_registry() {
        let f = fixture();
        let registry = build(&f).unwrap();
        assert!(registry.is_empty());
        assert!(registry.get("home.tmpl").is_none());
    }
}
