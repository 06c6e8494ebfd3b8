use std::path::Path;

/// Fallback for files whose extension maps to no known type.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type derived from the file extension.
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(content_type_for(Path::new("data/inputs.json")), "application/json");
        assert_eq!(content_type_for(Path::new("README.txt")), "text/plain");
    }

    #[test]
    fn unknown_or_missing_extension_is_binary() {
        assert_eq!(
            content_type_for(Path::new("variables/variables.data-00000-of-00001")),
            OCTET_STREAM
        );
        assert_eq!(content_type_for(Path::new("LICENSE")), OCTET_STREAM);
    }
}
