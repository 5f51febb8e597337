//! Application package loading.
//!
//! An application is made of three parts: a metadata document, one or more
//! Compose documents and any number of settings documents. On disk it is
//! either a directory holding one file per part, or a single file holding the
//! three documents separated by [`SINGLE_FILE_SEPARATOR`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use appdef_settings::{load_multiple, LoadOptions, Settings};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{TypesError, TypesResult};
use crate::metadata::AppMetadata;

/// Metadata file name inside a directory application.
pub const METADATA_FILE_NAME: &str = "metadata.yml";
/// Compose file name inside a directory application.
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";
/// Settings file name inside a directory application.
pub const SETTINGS_FILE_NAME: &str = "settings.yml";
/// Separator between documents of a single-file application.
pub const SINGLE_FILE_SEPARATOR: &str = "\n---\n";
/// Conventional extension of application directories.
pub const APP_EXTENSION: &str = ".dockerapp";

/// Where an application was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppSource {
    Directory,
    SingleFile,
    InMemory,
}

/// A file shipped with a directory application besides its three main files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Path relative to the application root, with forward slashes.
    pub path: String,
    pub size: u64,
}

/// A loaded application package.
#[derive(Debug, Clone)]
pub struct App {
    name: String,
    path: PathBuf,
    source: AppSource,
    composes: Vec<String>,
    settings_raw: Vec<Vec<u8>>,
    settings: Settings,
    metadata_raw: Vec<u8>,
    metadata: AppMetadata,
    attachments: Vec<Attachment>,
}

impl App {
    /// Create an empty in-memory application.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(&name),
            name,
            source: AppSource::InMemory,
            composes: Vec::new(),
            settings_raw: Vec::new(),
            settings: Settings::new(),
            metadata_raw: Vec::new(),
            metadata: AppMetadata::default(),
            attachments: Vec::new(),
        }
    }

    /// Set the metadata document.
    pub fn with_metadata(mut self, data: impl Into<Vec<u8>>) -> TypesResult<Self> {
        let data = data.into();
        self.metadata = AppMetadata::load(&data)?;
        self.metadata_raw = data;
        Ok(self)
    }

    /// Append a Compose document.
    pub fn with_compose(mut self, data: impl Into<String>) -> Self {
        self.composes.push(data.into());
        self
    }

    /// Append a settings document. Later documents override earlier ones.
    pub fn with_settings(mut self, data: impl Into<Vec<u8>>) -> TypesResult<Self> {
        self.settings_raw.push(data.into());
        self.settings = load_multiple(&self.settings_raw, &LoadOptions::new())?;
        Ok(self)
    }

    /// Append settings files, in order.
    pub fn with_settings_files<P: AsRef<Path>>(mut self, files: &[P]) -> TypesResult<Self> {
        for file in files {
            let data = read_file(file.as_ref())?;
            self = self.with_settings(data)?;
        }
        Ok(self)
    }

    /// Open an application from a directory or a single file.
    pub fn open(path: impl AsRef<Path>) -> TypesResult<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::from_dir(path)
        } else if path.is_file() {
            Self::from_single_file(path)
        } else {
            Err(TypesError::NotFound(path.to_path_buf()))
        }
    }

    /// Load a directory application.
    pub fn from_dir(path: impl AsRef<Path>) -> TypesResult<Self> {
        let root = path.as_ref();
        info!("Loading application from directory {:?}", root);

        let metadata = read_file(&root.join(METADATA_FILE_NAME))?;
        let compose = read_file(&root.join(COMPOSE_FILE_NAME))?;
        let settings = read_file(&root.join(SETTINGS_FILE_NAME))?;

        let mut app = Self::new(app_name_from_dir(root))
            .with_metadata(metadata)?
            .with_compose(String::from_utf8_lossy(&compose).into_owned())
            .with_settings(settings)?;
        app.path = root.to_path_buf();
        app.source = AppSource::Directory;
        app.attachments = collect_attachments(root)?;
        Ok(app)
    }

    /// Load a single-file application.
    pub fn from_single_file(path: impl AsRef<Path>) -> TypesResult<Self> {
        let file = path.as_ref();
        info!("Loading single-file application {:?}", file);

        let content = String::from_utf8_lossy(&read_file(file)?).into_owned();
        let parts: Vec<&str> = content.split(SINGLE_FILE_SEPARATOR).collect();
        if parts.len() != 3 {
            return Err(TypesError::MalformedSingleFile(parts.len()));
        }

        let mut app = Self::new(app_name_from_dir(file))
            .with_metadata(parts[0].as_bytes().to_vec())?
            .with_compose(parts[1])
            .with_settings(parts[2].as_bytes().to_vec())?;
        app.path = file.to_path_buf();
        app.source = AppSource::SingleFile;
        Ok(app)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> AppSource {
        self.source
    }

    /// Compose documents, in order.
    pub fn composes(&self) -> &[String] {
        &self.composes
    }

    /// Raw settings documents, in order.
    pub fn settings_raw(&self) -> &[Vec<u8>] {
        &self.settings_raw
    }

    /// All settings documents merged.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn metadata_raw(&self) -> &[u8] {
        &self.metadata_raw
    }

    pub fn metadata(&self) -> &AppMetadata {
        &self.metadata
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Write the application as a directory.
    pub fn split(&self, output_dir: impl AsRef<Path>) -> TypesResult<()> {
        let (compose, settings) = self.single_parts("split")?;
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;
        fs::write(output_dir.join(METADATA_FILE_NAME), &self.metadata_raw)?;
        fs::write(output_dir.join(COMPOSE_FILE_NAME), compose)?;
        fs::write(output_dir.join(SETTINGS_FILE_NAME), settings)?;
        debug!("Split application {} into {:?}", self.name, output_dir);
        Ok(())
    }

    /// Write the application in single-file format.
    pub fn merge_into<W: Write>(&self, target: &mut W) -> TypesResult<()> {
        let (compose, settings) = self.single_parts("merge")?;
        target.write_all(&self.metadata_raw)?;
        target.write_all(SINGLE_FILE_SEPARATOR.as_bytes())?;
        target.write_all(compose.as_bytes())?;
        target.write_all(SINGLE_FILE_SEPARATOR.as_bytes())?;
        target.write_all(settings)?;
        Ok(())
    }

    fn single_parts(&self, operation: &'static str) -> TypesResult<(&str, &[u8])> {
        if self.composes.len() > 1 {
            return Err(TypesError::Unsupported {
                operation,
                what: "compose",
            });
        }
        if self.settings_raw.len() > 1 {
            return Err(TypesError::Unsupported {
                operation,
                what: "setting",
            });
        }
        let compose = self.composes.first().map(String::as_str).unwrap_or_default();
        let settings = self.settings_raw.first().map(Vec::as_slice).unwrap_or_default();
        Ok((compose, settings))
    }
}

/// Derive an application name from its path, dropping the `.dockerapp` extension.
pub fn app_name_from_dir(path: impl AsRef<Path>) -> String {
    let base = path
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.strip_suffix(APP_EXTENSION)
        .map(str::to_string)
        .unwrap_or(base)
}

fn read_file(path: &Path) -> TypesResult<Vec<u8>> {
    fs::read(path).map_err(|source| TypesError::ReadFile {
        file: path.to_path_buf(),
        source,
    })
}

fn collect_attachments(root: &Path) -> TypesResult<Vec<Attachment>> {
    let mut attachments = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        if matches!(
            relative.as_str(),
            METADATA_FILE_NAME | COMPOSE_FILE_NAME | SETTINGS_FILE_NAME
        ) {
            continue;
        }
        attachments.push(Attachment {
            path: relative,
            size: entry.metadata()?.len(),
        });
    }
    Ok(attachments)
}
