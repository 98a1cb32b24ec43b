//! Interfaces to the systems around the pipeline: document storage and RBAC.
//!
//! The pipeline never asks "who is the current user"; every entry point
//! takes an explicit `ActingContext`.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::RwLock;

use serde::Serialize;
use thiserror::Error;

use crate::config::UserConfig;
use crate::models::{Category, Document};

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Cannot read document {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// `getDocument(id) -> Document | NotFound`.
pub trait DocumentSource: Send + Sync {
    fn get_document(&self, id: &str) -> Result<Document, DocumentError>;
}

/// What a user may do through the exposed interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub run_analysis: bool,
    pub view_findings: bool,
    pub verify_dispute: bool,
    pub view_audit: bool,
}

impl Permissions {
    pub fn all() -> Self {
        Self {
            run_analysis: true,
            view_findings: true,
            verify_dispute: true,
            view_audit: true,
        }
    }

    /// Unknown names are ignored.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut p = Self::default();
        for name in names {
            match name.as_ref() {
                "run_analysis" => p.run_analysis = true,
                "view_findings" => p.view_findings = true,
                "verify_dispute" => p.verify_dispute = true,
                "view_audit" => p.view_audit = true,
                other => tracing::warn!(permission = other, "Ignoring unknown permission"),
            }
        }
        p
    }
}

/// Who is calling, passed into every orchestrator entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActingContext {
    pub user: String,
    pub permissions: Permissions,
}

impl ActingContext {
    pub fn new(user: &str, permissions: Permissions) -> Self {
        Self {
            user: user.to_string(),
            permissions,
        }
    }
}

/// RBAC collaborator: `isAccessible(user, documentId) -> bool`.
pub trait AccessControl: Send + Sync {
    fn is_accessible(&self, user: &str, document_id: &str) -> bool;

    /// Resolve a user name into an acting context. `None` for unknown users.
    fn resolve(&self, user: &str) -> Option<ActingContext>;
}

/// In-memory document store keyed by id.
#[derive(Default)]
pub struct DocumentLibrary {
    documents: RwLock<HashMap<String, Document>>,
}

impl DocumentLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, document: Document) {
        let mut docs = self.documents.write().unwrap_or_else(|p| p.into_inner());
        docs.insert(document.id.clone(), document);
    }

    /// Ingest text, inferring the category from the file name.
    /// The document id is the file name.
    pub fn ingest_text(&self, file_name: &str, content: &str) -> Document {
        let doc = Document::new(file_name, file_name, Category::infer_from_name(file_name), content);
        self.insert(doc.clone());
        doc
    }

    pub fn ingest_file(&self, path: &Path) -> Result<Document, DocumentError> {
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(self.ingest_text(&name, &content))
    }

    /// Load every regular file directly under `dir`. Unreadable files are skipped.
    pub fn load_dir(&self, dir: &Path) -> Result<usize, DocumentError> {
        let entries = std::fs::read_dir(dir).map_err(|source| DocumentError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let mut loaded = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match self.ingest_file(&path) {
                Ok(doc) => {
                    tracing::info!(document_id = %doc.id, category = %doc.category, "Loaded document");
                    loaded += 1;
                }
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable document"),
            }
        }
        Ok(loaded)
    }

    pub fn len(&self) -> usize {
        self.documents.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentSource for DocumentLibrary {
    fn get_document(&self, id: &str) -> Result<Document, DocumentError> {
        let docs = self.documents.read().unwrap_or_else(|p| p.into_inner());
        docs.get(id)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))
    }
}

struct UserGrant {
    permissions: Permissions,
    all_documents: bool,
    documents: HashSet<String>,
}

/// Access policy built from the `[[users]]` config table.
#[derive(Default)]
pub struct StaticAccessPolicy {
    users: HashMap<String, UserGrant>,
}

impl StaticAccessPolicy {
    pub fn from_config(users: &[UserConfig]) -> Self {
        let users = users
            .iter()
            .map(|u| {
                let grant = UserGrant {
                    permissions: Permissions::from_names(&u.permissions),
                    all_documents: u.documents.iter().any(|d| d == "*"),
                    documents: u.documents.iter().filter(|d| *d != "*").cloned().collect(),
                };
                (u.name.clone(), grant)
            })
            .collect();
        Self { users }
    }

    /// Single user with every permission over every document. Used by the CLI.
    pub fn single_user(name: &str) -> Self {
        let mut users = HashMap::new();
        users.insert(
            name.to_string(),
            UserGrant {
                permissions: Permissions::all(),
                all_documents: true,
                documents: HashSet::new(),
            },
        );
        Self { users }
    }
}

impl AccessControl for StaticAccessPolicy {
    fn is_accessible(&self, user: &str, document_id: &str) -> bool {
        self.users
            .get(user)
            .map(|g| g.all_documents || g.documents.contains(document_id))
            .unwrap_or(false)
    }

    fn resolve(&self, user: &str) -> Option<ActingContext> {
        self.users
            .get(user)
            .map(|g| ActingContext::new(user, g.permissions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Vec<UserConfig> {
        vec![
            UserConfig {
                name: "secretary".into(),
                role: Some("company_secretary".into()),
                permissions: vec!["run_analysis".into(), "view_findings".into(), "view_audit".into()],
                documents: vec!["*".into()],
            },
            UserConfig {
                name: "director".into(),
                role: None,
                permissions: vec!["view_findings".into(), "verify_dispute".into()],
                documents: vec!["minutes-jan.txt".into()],
            },
        ]
    }

    #[test]
    fn policy_grants_documents() {
        let policy = StaticAccessPolicy::from_config(&users());
        assert!(policy.is_accessible("secretary", "anything"));
        assert!(policy.is_accessible("director", "minutes-jan.txt"));
        assert!(!policy.is_accessible("director", "coi-2026.txt"));
        assert!(!policy.is_accessible("stranger", "minutes-jan.txt"));
    }

    #[test]
    fn resolve_maps_permissions() {
        let policy = StaticAccessPolicy::from_config(&users());
        let ctx = policy.resolve("director").unwrap();
        assert!(ctx.permissions.verify_dispute);
        assert!(!ctx.permissions.run_analysis);
        assert!(policy.resolve("stranger").is_none());
    }

    #[test]
    fn library_round_trip_and_not_found() {
        let lib = DocumentLibrary::new();
        let doc = lib.ingest_text("Board_Minutes_March.txt", "Quorum confirmed.");
        assert_eq!(doc.category, Category::Minutes);
        assert_eq!(lib.get_document("Board_Minutes_March.txt").unwrap().fingerprint, doc.fingerprint);
        assert!(matches!(lib.get_document("nope"), Err(DocumentError::NotFound(_))));
    }

    #[test]
    fn load_dir_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("COI_Disclosures.txt"), "Director A: Vendor X").unwrap();
        std::fs::write(dir.path().join("Travel_Policy.txt"), "Economy class").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let lib = DocumentLibrary::new();
        assert_eq!(lib.load_dir(dir.path()).unwrap(), 2);
        assert_eq!(lib.get_document("COI_Disclosures.txt").unwrap().category, Category::Disclosure);
        assert_eq!(lib.get_document("Travel_Policy.txt").unwrap().category, Category::Policy);
    }
}
