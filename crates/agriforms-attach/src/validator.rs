//! Five-stage attachment validator

use crate::config::{normalize_extension, ValidatorConfig};
use crate::filename::{extension_of, FilenameRules};
use crate::patterns::ContentScanner;
use crate::signatures::SignatureTable;
use crate::{ConfigError, Rejection, DEFAULT_ALLOWED_EXTENSIONS};
use std::collections::HashSet;

/// Stage 1: size limit. A file of exactly `max_bytes` passes.
pub fn check_size(len: usize, max_bytes: usize) -> Result<(), Rejection> {
    if len > max_bytes {
        return Err(Rejection::TooLarge { size: len, max: max_bytes });
    }
    Ok(())
}

/// Stage 2: extension allow-list. Returns the extension on success.
pub fn check_extension(filename: &str, allowed: &HashSet<String>) -> Result<String, Rejection> {
    let extension = extension_of(filename);
    if !allowed.contains(&extension) {
        return Err(Rejection::ExtensionNotAllowed { extension });
    }
    Ok(extension)
}

/// Stage 3: leading bytes against the signature for `extension`
pub fn check_signature(signatures: &SignatureTable, extension: &str, content: &[u8]) -> Result<(), Rejection> {
    if !signatures.matches(extension, content) {
        return Err(Rejection::SignatureMismatch {
            extension: extension.to_string(),
        });
    }
    Ok(())
}

/// Stage 5: file name sanity
pub fn check_filename(rules: &FilenameRules, filename: &str) -> Result<(), Rejection> {
    rules.check(filename).map_err(Rejection::SuspiciousFilename)
}

/// Content-based upload validator
pub struct AttachmentValidator {
    max_bytes: usize,
    allowed: HashSet<String>,
    signatures: SignatureTable,
    scanner: ContentScanner,
    filenames: FilenameRules,
}

impl AttachmentValidator {
    /// Build from configuration.
    ///
    /// Every extra extension needs a content signature, built-in or
    /// configured, unless it is listed in `unsigned_extensions`.
    pub fn new(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let mut signatures = SignatureTable::builtin();
        for (ext, hex) in &config.extra_signatures {
            signatures.insert_hex(ext, hex)?;
        }

        let unsigned: HashSet<String> = config
            .unsigned_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .collect();

        let mut allowed: HashSet<String> =
            DEFAULT_ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        for ext in config.extra_extensions.iter().map(|e| normalize_extension(e)) {
            if !signatures.contains(&ext) && !unsigned.contains(&ext) {
                return Err(ConfigError::UnsignedExtension(ext));
            }
            allowed.insert(ext);
        }

        tracing::debug!(
            max_bytes = config.max_bytes,
            scan_window = config.scan_window,
            allowed = allowed.len(),
            "attachment validator ready"
        );

        Ok(Self {
            max_bytes: config.max_bytes,
            allowed,
            signatures,
            scanner: ContentScanner::new(config.scan_window)?,
            filenames: FilenameRules::new()?,
        })
    }

    /// Validator with the default configuration
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::new(&ValidatorConfig::default())
    }

    /// Run all five checks in order, stopping at the first failure.
    ///
    /// `declared_mime` is logged but never trusted.
    pub fn validate(&self, filename: &str, declared_mime: &str, content: &[u8]) -> Result<(), Rejection> {
        let result = self.run_checks(filename, content);
        match &result {
            Ok(()) => tracing::debug!(filename, declared_mime, size = content.len(), "attachment accepted"),
            Err(rejection) => tracing::warn!(
                filename,
                declared_mime,
                size = content.len(),
                reason = rejection.code(),
                "attachment rejected"
            ),
        }
        result
    }

    fn run_checks(&self, filename: &str, content: &[u8]) -> Result<(), Rejection> {
        check_size(content.len(), self.max_bytes)?;

        let extension = check_extension(filename, &self.allowed)?;

        check_signature(&self.signatures, &extension, content)?;

        if let Some(pattern) = self.scanner.scan(content) {
            return Err(Rejection::DangerousContent { pattern });
        }

        check_filename(&self.filenames, filename)
    }

    /// Size limit in bytes
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Whether an extension is on the allow-list
    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed.contains(&normalize_extension(extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilenameIssue;

    const PDF: &[u8] = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n1 0 obj\n<< /Type /Catalog >>\nendobj\n";

    fn validator_with_max(max_bytes: usize) -> AttachmentValidator {
        AttachmentValidator::new(&ValidatorConfig {
            max_bytes,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_accepts_clean_pdf() {
        let v = AttachmentValidator::with_defaults().unwrap();
        assert_eq!(v.validate("attestation.pdf", "application/pdf", PDF), Ok(()));
    }

    #[test]
    fn test_size_boundary() {
        let mut content = b"%PDF".to_vec();
        content.resize(64, b' ');
        let v = validator_with_max(64);
        assert_eq!(v.validate("a.pdf", "application/pdf", &content), Ok(()));

        content.push(b' ');
        assert_eq!(
            v.validate("a.pdf", "application/pdf", &content),
            Err(Rejection::TooLarge { size: 65, max: 64 })
        );
    }

    #[test]
    fn test_extension_not_allowed() {
        let v = AttachmentValidator::with_defaults().unwrap();
        assert_eq!(
            v.validate("notes.txt", "text/plain", b"hello world"),
            Err(Rejection::ExtensionNotAllowed { extension: "txt".into() })
        );
        assert_eq!(
            v.validate("noextension", "application/pdf", PDF),
            Err(Rejection::ExtensionNotAllowed { extension: String::new() })
        );
    }

    #[test]
    fn test_jpeg_disguised_as_pdf() {
        let v = AttachmentValidator::with_defaults().unwrap();
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
        assert_eq!(
            v.validate("report.pdf", "application/pdf", &jpeg),
            Err(Rejection::SignatureMismatch { extension: "pdf".into() })
        );
    }

    #[test]
    fn test_declared_mime_is_not_trusted() {
        let v = AttachmentValidator::with_defaults().unwrap();
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        // a lying MIME type does not matter when the bytes match the extension
        assert_eq!(v.validate("photo.png", "application/x-msdownload", &png), Ok(()));
    }

    #[test]
    fn test_tiny_file_fails_signature() {
        let v = AttachmentValidator::with_defaults().unwrap();
        assert_eq!(
            v.validate("a.pdf", "application/pdf", b"%PD"),
            Err(Rejection::SignatureMismatch { extension: "pdf".into() })
        );
    }

    #[test]
    fn test_script_inside_pdf() {
        let v = AttachmentValidator::with_defaults().unwrap();
        let content = b"%PDF-1.4\n/JS (app.alert); <SCRIPT>evil()</SCRIPT>";
        assert_eq!(
            v.validate("form.pdf", "application/pdf", content),
            Err(Rejection::DangerousContent { pattern: "<script" })
        );
    }

    #[test]
    fn test_filename_stage_runs_last() {
        let v = AttachmentValidator::with_defaults().unwrap();
        assert_eq!(
            v.validate(".cache.pdf", "application/pdf", PDF),
            Err(Rejection::SuspiciousFilename(FilenameIssue::Hidden))
        );
        // executable suffix is already caught by the allow-list
        assert_eq!(
            v.validate("invoice.pdf.exe", "application/pdf", PDF),
            Err(Rejection::ExtensionNotAllowed { extension: "exe".into() })
        );
    }

    #[test]
    fn test_checks_short_circuit_in_order() {
        let v = validator_with_max(4);
        // too large, wrong extension and dangerous: size wins
        assert_eq!(v.validate("x.exe", "", b"<script>").unwrap_err().code(), "too_large");
    }

    #[test]
    fn test_stage_functions() {
        assert_eq!(check_size(10, 10), Ok(()));
        assert!(check_size(11, 10).is_err());

        let allowed: HashSet<String> = ["pdf".to_string()].into_iter().collect();
        assert_eq!(check_extension("A.PDF", &allowed), Ok("pdf".to_string()));

        let table = SignatureTable::builtin();
        assert_eq!(check_signature(&table, "png", b"\x89PNG\r\n"), Ok(()));
        assert!(check_signature(&table, "png", b"GIF89a").is_err());

        let rules = FilenameRules::new().unwrap();
        assert_eq!(
            check_filename(&rules, "invoice.pdf.exe"),
            Err(Rejection::SuspiciousFilename(FilenameIssue::ExecutableSuffix))
        );
    }

    #[test]
    fn test_extra_extension_requires_signature() {
        let config = ValidatorConfig {
            extra_extensions: vec!["txt".into()],
            ..Default::default()
        };
        assert!(matches!(
            AttachmentValidator::new(&config),
            Err(ConfigError::UnsignedExtension(ext)) if ext == "txt"
        ));

        let config = ValidatorConfig {
            extra_extensions: vec!["txt".into()],
            unsigned_extensions: vec![".TXT".into()],
            ..Default::default()
        };
        let v = AttachmentValidator::new(&config).unwrap();
        assert_eq!(v.validate("notes.txt", "text/plain", b"plain notes"), Ok(()));
    }

    #[test]
    fn test_extra_extension_with_builtin_or_configured_signature() {
        let mut config = ValidatorConfig {
            extra_extensions: vec!["xlsx".into(), ".odt".into()],
            ..Default::default()
        };
        config.extra_signatures.insert("odt".into(), "504B0304".into());
        let v = AttachmentValidator::new(&config).unwrap();

        assert!(v.allows_extension("XLSX"));
        assert_eq!(v.validate("budget.odt", "", b"PK\x03\x04content"), Ok(()));
        assert_eq!(
            v.validate("budget.odt", "", b"MZ\x90\x00binary"),
            Err(Rejection::SignatureMismatch { extension: "odt".into() })
        );
    }

    #[test]
    fn test_validator_does_not_mutate_input() {
        let v = AttachmentValidator::with_defaults().unwrap();
        let content = PDF.to_vec();
        let before = content.clone();
        let _ = v.validate("a.pdf", "application/pdf", &content);
        assert_eq!(content, before);
        assert_eq!(
            v.validate("a.pdf", "application/pdf", &content),
            v.validate("a.pdf", "application/pdf", &content)
        );
    }
}
