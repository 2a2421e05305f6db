//! Content Store — read-through, TTL-cached view of the markdown portfolio content.
//!
//! Layout under the content root:
//! - `projects/<id>.md` — one file per project, id = file stem
//! - `about/about.md`   — optional owner description
//!
//! Lists are reloaded lazily on the first call after the TTL has elapsed.
//! `get_project` always reads the file directly.

pub mod handlers;
pub mod markdown;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use crate::content::markdown::{about_from_document, parse_document, project_from_document};
use crate::models::portfolio::{AboutInfo, Project};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid frontmatter: {0}")]
    Frontmatter(#[from] serde_yaml::Error),

    #[error("Invalid content path pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Invalid project id: {0}")]
    InvalidId(String),

    #[error("Content task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

struct Cached<T> {
    value: T,
    loaded_at: Instant,
}

impl<T: Clone> Cached<T> {
    fn fresh(&self, ttl: Duration) -> Option<T> {
        (self.loaded_at.elapsed() < ttl).then(|| self.value.clone())
    }
}

pub struct ContentStore {
    root: PathBuf,
    ttl: Duration,
    projects: Mutex<Option<Cached<Vec<Project>>>>,
    about: Mutex<Option<Cached<Option<AboutInfo>>>>,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            root: root.into(),
            ttl,
            projects: Mutex::new(None),
            about: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All projects in file-path order.
    pub fn list_projects(&self) -> Result<Vec<Project>, ContentError> {
        let mut cache = self.projects.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(projects) = cache.as_ref().and_then(|c| c.fresh(self.ttl)) {
            return Ok(projects);
        }

        let projects = self.load_projects()?;
        info!(
            "Loaded {} projects from {}",
            projects.len(),
            self.root.display()
        );
        *cache = Some(Cached {
            value: projects.clone(),
            loaded_at: Instant::now(),
        });
        Ok(projects)
    }

    /// `list_projects` on the blocking thread pool, for callers on the async executor.
    pub async fn list_projects_blocking(self: &Arc<Self>) -> Result<Vec<Project>, ContentError> {
        let store = Arc::clone(self);
        tokio::task::spawn_blocking(move || store.list_projects()).await?
    }

    /// Reads `projects/<id>.md` directly. `Ok(None)` when the file does not exist.
    pub fn get_project(&self, id: &str) -> Result<Option<Project>, ContentError> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(ContentError::InvalidId(id.to_string()));
        }

        let path = self.root.join("projects").join(format!("{id}.md"));
        if !path.is_file() {
            return Ok(None);
        }
        let doc = parse_document(&read_file(&path)?)?;
        Ok(Some(project_from_document(id, doc)))
    }

    /// The owner description, `Ok(None)` when `about/about.md` is absent.
    /// An absent file is not cached so that adding it takes effect immediately.
    pub fn get_about(&self) -> Result<Option<AboutInfo>, ContentError> {
        let mut cache = self.about.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(about) = cache.as_ref().and_then(|c| c.fresh(self.ttl)) {
            return Ok(about);
        }

        let path = self.root.join("about").join("about.md");
        if !path.is_file() {
            debug!("No about page at {}", path.display());
            return Ok(None);
        }

        let about = Some(about_from_document(parse_document(&read_file(&path)?)?));
        *cache = Some(Cached {
            value: about.clone(),
            loaded_at: Instant::now(),
        });
        Ok(about)
    }

    fn load_projects(&self) -> Result<Vec<Project>, ContentError> {
        let dir = self.root.join("projects");
        let pattern = format!("{}/*.md", glob::Pattern::escape(&dir.to_string_lossy()));

        let mut projects = Vec::new();
        // glob yields paths in sorted order
        for entry in glob::glob(&pattern)? {
            let path = entry.map_err(|e| ContentError::Io {
                path: e.path().to_path_buf(),
                source: e.into_error(),
            })?;
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let doc = parse_document(&read_file(&path)?)?;
            projects.push(project_from_document(id, doc));
        }
        Ok(projects)
    }
}

fn read_file(path: &Path) -> Result<String, ContentError> {
    std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })
}
