//! @ai:module:intent Define language-specific declaration syntax for docblock scanning
//! @ai:module:layer domain
//! @ai:module:public_api Language, detect_language, is_supported_file
//! @ai:module:stateless true

use std::path::Path;

/// @ai:intent Represents a supported source language whose classes carry `/** */` docblocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Php,
    Java,
    TypeScript,
    JavaScript,
}

/// @ai:intent Declaration patterns used to locate classes, methods and constants
#[derive(Debug, Clone)]
pub struct DeclarationSyntax {
    pub namespace: Option<&'static str>,
    pub namespace_separator: &'static str,
    pub class: &'static str,
    pub method: &'static str,
    pub constant: &'static str,
    pub line_comments: &'static [&'static str],
}

impl Language {
    /// @ai:intent Get the declaration syntax for this language
    /// @ai:effects pure
    pub fn syntax(&self) -> DeclarationSyntax {
        match self {
            Language::Php => DeclarationSyntax {
                namespace: Some(r"^\s*namespace\s+([\w\\]+)\s*[;{]"),
                namespace_separator: "\\",
                class: r"^\s*(?:(?:abstract|final|readonly)\s+)*(?:class|trait|interface)\s+(\w+)",
                method: r"^\s*(?:(?:public|protected|private|static|final|abstract)\s+)*function\s+&?(\w+)\s*\(",
                constant: r"^\s*(?:(?:public|protected|private|final)\s+)*const\s+(\w+)\s*=",
                line_comments: &["//", "#"],
            },
            Language::Java => DeclarationSyntax {
                namespace: Some(r"^\s*package\s+([\w.]+)\s*;"),
                namespace_separator: ".",
                class: r"^\s*(?:(?:public|protected|private|abstract|final|static)\s+)*(?:class|interface|enum|record)\s+(\w+)",
                method: r"^\s*(?:(?:public|protected|private|static|final|abstract|synchronized)\s+)*(?:<[^>]+>\s+)?[\w<>\[\],.? ]+\s+(\w+)\s*\([^;]*$",
                constant: r"^\s*(?:(?:public|protected|private)\s+)?static\s+final\s+[\w<>\[\]]+\s+(\w+)\s*=",
                line_comments: &["//"],
            },
            Language::TypeScript | Language::JavaScript => DeclarationSyntax {
                namespace: None,
                namespace_separator: ".",
                class: r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)",
                method: r"^\s*(?:(?:public|protected|private|static|async|readonly)\s+)*(\w+)\s*\([^;]*\)\s*(?::\s*[^{]+)?\{",
                constant: r"^\s*(?:(?:public|protected|private)\s+)?static\s+(?:readonly\s+)?(\w+)\s*(?::\s*[^=]+)?=",
                line_comments: &["//"],
            },
        }
    }

    /// @ai:intent Get file extensions for this language
    /// @ai:effects pure
    pub fn extensions(&self) -> &[&str] {
        match self {
            Language::Php => &["php"],
            Language::Java => &["java"],
            Language::TypeScript => &["ts", "tsx"],
            Language::JavaScript => &["js", "jsx", "mjs"],
        }
    }

    /// @ai:intent Get language name as string
    /// @ai:effects pure
    pub fn name(&self) -> &'static str {
        match self {
            Language::Php => "php",
            Language::Java => "java",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
        }
    }
}

/// @ai:intent Detect the programming language from a file path
/// @ai:example ("Movie.php") -> Some(Php)
/// @ai:example ("Movie.java") -> Some(Java)
/// @ai:example ("movie.rs") -> None
/// @ai:effects pure
pub fn detect_language(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?;

    let all_languages = [
        Language::Php,
        Language::Java,
        Language::TypeScript,
        Language::JavaScript,
    ];

    all_languages
        .into_iter()
        .find(|lang| lang.extensions().contains(&ext))
}

/// @ai:intent Check if a file should be scanned based on extension
/// @ai:effects pure
pub fn is_supported_file(path: &Path) -> bool {
    detect_language(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_detect_php() {
        assert_eq!(detect_language(Path::new("Movie.php")), Some(Language::Php));
    }

    #[test]
    fn test_detect_typescript() {
        assert_eq!(
            detect_language(Path::new("movie.ts")),
            Some(Language::TypeScript)
        );
    }

    #[test]
    fn test_unsupported() {
        assert_eq!(detect_language(Path::new("movie.rs")), None);
        assert!(!is_supported_file(Path::new("README.md")));
    }

    #[test]
    fn test_php_method_pattern() {
        let re = Regex::new(Language::Php.syntax().method).unwrap();
        let captures = re.captures("    public function PATCH(Request $request)").unwrap();
        assert_eq!(&captures[1], "PATCH");
    }

    #[test]
    fn test_java_method_pattern() {
        let re = Regex::new(Language::Java.syntax().method).unwrap();
        let captures = re.captures("    public Response GET(String id) {").unwrap();
        assert_eq!(&captures[1], "GET");
        assert!(re.captures("        return service.find(id);").is_none());
    }

    #[test]
    fn test_typescript_method_pattern() {
        let re = Regex::new(Language::TypeScript.syntax().method).unwrap();
        let captures = re.captures("  public async DELETE(id: string): Promise<void> {").unwrap();
        assert_eq!(&captures[1], "DELETE");
    }
}
