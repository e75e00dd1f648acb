//! Naming of working files.

use std::path::Path;

use image::ImageFormat;
use mime::{self, Mime};


/// Longest name (in bytes) of a working file.
const MAX_NAME_LENGTH: usize = 96;
/// Name of a file when the URL doesn't give one.
const FALLBACK_NAME: &str = "image";


/// Turn an arbitrary string (like a URL path segment) into a safe file name.
///
/// Only ASCII letters, digits, `.`, `-` and `_` are kept,
/// with everything else replaced by `_`. Leading dots are removed.
pub fn sanitize_name(name: &str) -> String {
    let mut result: String = name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    result = result.trim_start_matches('.').to_owned();
    if result.len() > MAX_NAME_LENGTH {
        // Keep the extension intact when truncating.
        let ext = Path::new(&result).extension()
            .and_then(|e| e.to_str()).map(|e| format!(".{}", e))
            .filter(|e| e.len() < MAX_NAME_LENGTH / 2)
            .unwrap_or_default();
        let stem: String = result.chars().take(MAX_NAME_LENGTH - ext.len()).collect();
        result = format!("{}{}", stem.trim_end_matches('.'), ext);
    }
    if result.is_empty() { FALLBACK_NAME.to_owned() } else { result }
}

/// Name of the output file for given input file.
///
/// If `new_ext` is given, it replaces the extension of the input.
pub fn output_name(input: &Path, new_ext: Option<&str>) -> String {
    let name = input.file_name().and_then(|n| n.to_str()).unwrap_or(FALLBACK_NAME);
    let name = format!("out_{}", name);
    match new_ext {
        Some(ext) => {
            let ext = ext.trim().trim_start_matches('.').to_lowercase();
            let stem = Path::new(&name).file_stem().and_then(|s| s.to_str())
                .unwrap_or(&name).to_owned();
            format!("{}.{}", stem, ext)
        }
        None => name,
    }
}

/// MIME type of an image file, judging by its extension.
pub fn mime_type<P: AsRef<Path>>(path: P) -> Mime {
    ImageFormat::from_path(path).ok()
        .and_then(|f| f.to_mime_type().parse().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}


#[cfg(test)]
mod tests {
    use std::path::Path;
    use spectral::prelude::*;
    use super::{mime_type, output_name, sanitize_name};

    #[test]
    fn sanitize() {
        assert_that!(sanitize_name("cat.jpg")).is_equal_to("cat.jpg".to_owned());
        assert_that!(sanitize_name("my cat (1).png")).is_equal_to("my_cat__1_.png".to_owned());
        assert_that!(sanitize_name("..")).is_equal_to("image".to_owned());
        assert_that!(sanitize_name(".hidden.gif")).is_equal_to("hidden.gif".to_owned());
        assert_that!(sanitize_name("")).is_equal_to("image".to_owned());
        assert_that!(sanitize_name("żółw.png")).is_equal_to("___w.png".to_owned());
    }

    #[test]
    fn sanitize_long_names() {
        let name = sanitize_name(&format!("{}.jpeg", "a".repeat(500)));
        assert_that!(name.len()).is_less_than_or_equal_to(96);
        assert!(name.ends_with(".jpeg"));
    }

    #[test]
    fn output_names() {
        assert_eq!("out_cat.jpg", output_name(Path::new("/tmp/x/cat.jpg"), None));
        assert_eq!("out_cat.png", output_name(Path::new("/tmp/x/cat.jpg"), Some("png")));
        assert_eq!("out_cat.png", output_name(Path::new("cat.jpg"), Some(".PNG")));
        assert_eq!("out_cat.tar.gif", output_name(Path::new("cat.tar.gz"), Some("gif")));
    }

    #[test]
    fn mime_types() {
        assert_eq!(mime::IMAGE_PNG, mime_type("out_cat.png"));
        assert_eq!(mime::IMAGE_JPEG, mime_type("cat.JPG"));
        assert_eq!(mime::APPLICATION_OCTET_STREAM, mime_type("notes.txt"));
    }
}
