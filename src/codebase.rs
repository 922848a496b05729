//! @ai:module:intent Index scanned source files so classes and methods can be resolved by name
//! @ai:module:layer application
//! @ai:module:public_api Codebase, normalize_class
//! @ai:module:depends_on reader, language, docblock, error
//! @ai:module:stateless false

use crate::docblock::{Docblock, Location};
use crate::error::{AnnotationError, ErrorKind, ParseResult, Result};
use crate::language::{is_supported_file, Language};
use crate::reader::{read_file, read_source, ClassSource, MethodSource, SourceFile};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// @ai:intent Strip the leading namespace separator from a class reference
/// @ai:example ("\\App\\Movie") -> "App\\Movie"
/// @ai:effects pure
pub fn normalize_class(reference: &str) -> &str {
    reference.trim().trim_start_matches('\\')
}

/// @ai:intent Read-only index of every class found in a set of source files
#[derive(Debug, Clone, Default)]
pub struct Codebase {
    files: Vec<PathBuf>,
    classes: BTreeMap<String, ClassSource>,
}

impl Codebase {
    /// @ai:intent Scan files and directories, indexing every supported source file
    /// @ai:effects fs:read
    pub fn scan<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut codebase = Codebase::default();

        for path in paths {
            let path = path.as_ref();

            if path.is_file() {
                codebase.add(read_file(path)?);
                continue;
            }

            for entry in WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let file_path = entry.path();
                if !is_supported_file(file_path) {
                    continue;
                }

                match read_file(file_path) {
                    Ok(file) => codebase.add(file),
                    Err(e) => tracing::warn!("Skipping {}: {}", file_path.display(), e),
                }
            }
        }

        tracing::debug!(
            "Indexed {} classes from {} files",
            codebase.classes.len(),
            codebase.files.len()
        );

        Ok(codebase)
    }

    /// @ai:intent Build an index from in-memory sources
    /// @ai:effects pure
    pub fn from_sources<'a, I>(sources: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, Language)>,
    {
        let mut codebase = Codebase::default();
        for (path, content, language) in sources {
            codebase.add(read_source(Path::new(path), content, language));
        }
        codebase
    }

    /// @ai:intent Add a scanned file; a later class with the same name replaces the earlier one
    pub fn add(&mut self, file: SourceFile) {
        self.files.push(file.path);
        for class in file.classes {
            self.classes.insert(class.name.clone(), class);
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// @ai:intent Iterate over all indexed classes in name order
    pub fn classes(&self) -> impl Iterator<Item = &ClassSource> {
        self.classes.values()
    }

    /// @ai:intent Find a class by fully-qualified name, with or without a leading `\`
    /// @ai:effects pure
    pub fn class(&self, name: &str) -> Option<&ClassSource> {
        self.classes.get(normalize_class(name))
    }

    /// @ai:intent Find a method on a class
    /// @ai:effects pure
    pub fn method(&self, class: &str, method: &str) -> Option<&MethodSource> {
        self.class(class)?.method(method)
    }

    /// @ai:intent Check if `class::method` exists
    pub fn is_callable(&self, class: &str, method: &str) -> bool {
        self.method(class, method).is_some()
    }

    /// @ai:intent Check if `class::CONSTANT` exists
    pub fn has_constant(&self, class: &str, constant: &str) -> bool {
        self.class(class)
            .map(|c| c.has_constant(constant))
            .unwrap_or(false)
    }

    /// @ai:intent Docblock attached to a class, or to one of its methods
    /// @ai:post Err(NoAnnotations) when the declaration has no docblock, located at the declaration
    /// @ai:effects pure
    pub fn docblock(&self, class: &str, method: Option<&str>) -> ParseResult<&Docblock> {
        let no_annotations = |location: Option<Location>| {
            let mut err =
                AnnotationError::new(ErrorKind::NoAnnotations).with_class(normalize_class(class));
            err.location = location;
            match method {
                Some(method) => err.with_method(method),
                None => err,
            }
        };

        let source = self.class(class).ok_or_else(|| no_annotations(None))?;
        let (docblock, line) = match method {
            Some(name) => match source.method(name) {
                Some(m) => (m.docblock.as_ref(), m.line),
                None => (None, source.line),
            },
            None => (source.docblock.as_ref(), source.line),
        };

        docblock.ok_or_else(|| no_annotations(Some(Location::new(source.file.clone(), line, line))))
    }
}
