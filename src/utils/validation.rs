use crate::api::error::AppError;
use std::path::Path;

/// Longest group name accepted
pub const MAX_GROUP_NAME_LEN: usize = 120;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::BadInput(e.to_string())
    }
}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size > max_size {
        return Err(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        });
    }
    Ok(())
}

/// Sanitizes filename to prevent path traversal and injection attacks
/// Returns the sanitized filename or an error if the name is invalid
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    // Only the last path component survives; Windows separators count too
    let name = filename.rsplit(['/', '\\']).next().unwrap_or("");
    let name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .trim();

    if name.is_empty() {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        });
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    if sanitized.starts_with('.') {
        return Err(ValidationError {
            code: "HIDDEN_FILE",
            message: "Hidden files (starting with '.') are not allowed".to_string(),
        });
    }

    Ok(sanitized)
}

/// Makes a filename safe to embed in an object key: ASCII alphanumerics,
/// `.`, `-` and `_` only.
pub fn key_safe_name(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Trims a group name and checks its length. Returns the trimmed name.
pub fn validate_group_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_GROUP_NAME_LEN {
        return Err(ValidationError {
            code: "INVALID_GROUP_NAME",
            message: format!(
                "Group name must be between 1 and {} characters",
                MAX_GROUP_NAME_LEN
            ),
        });
    }
    Ok(trimmed.to_string())
}

/// Picks the MIME type to record for an upload: the client's declared type
/// unless it is missing or generic, then magic-byte sniffing, then
/// `application/octet-stream`.
pub fn detect_mime_type(declared: Option<&str>, data: &[u8]) -> String {
    let declared = declared
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_lowercase())
        .filter(|ct| !ct.is_empty() && ct != mime::APPLICATION_OCTET_STREAM.as_ref());

    if let Some(ct) = declared {
        return ct;
    }

    infer::get(data)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\report.pdf").unwrap(), "report.pdf");
        assert_eq!(sanitize_filename("report.pdf").unwrap(), "report.pdf");
    }

    #[test]
    fn test_sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize_filename("a<b>c?.txt").unwrap(), "a_b_c_.txt");
    }

    #[test]
    fn test_sanitize_rejects_empty_and_hidden() {
        assert_eq!(sanitize_filename("").unwrap_err().code, "INVALID_FILENAME");
        assert_eq!(sanitize_filename("dir/").unwrap_err().code, "INVALID_FILENAME");
        assert_eq!(sanitize_filename(".env").unwrap_err().code, "HIDDEN_FILE");
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let long = "é".repeat(200);
        let sanitized = sanitize_filename(&long).unwrap();
        assert!(sanitized.len() <= 255);
        assert!(sanitized.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_key_safe_name() {
        assert_eq!(key_safe_name("my report (1).pdf"), "my_report__1_.pdf");
        assert_eq!(key_safe_name(""), "file");
    }

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(10, 10).is_ok());
        assert_eq!(validate_file_size(11, 10).unwrap_err().code, "FILE_TOO_LARGE");
    }

    #[test]
    fn test_validate_group_name() {
        assert_eq!(validate_group_name("  team  ").unwrap(), "team");
        assert!(validate_group_name("   ").is_err());
        assert!(validate_group_name(&"x".repeat(MAX_GROUP_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_detect_mime_type() {
        assert_eq!(
            detect_mime_type(Some("application/pdf; charset=binary"), b"x"),
            "application/pdf"
        );
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(detect_mime_type(None, &png), "image/png");
        assert_eq!(
            detect_mime_type(Some("application/octet-stream"), b"plain"),
            "application/octet-stream"
        );
    }
}
