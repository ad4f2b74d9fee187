//! File attachments that can ride along with a prompt

use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file type for {name}: {mime_type} (attach an image or a .txt file)")]
    Unsupported { name: String, mime_type: String },
}

/// A single user-selected file waiting to be sent with the next prompt.
///
/// Images travel as inline binary data. Plain-text files are decoded up front
/// and their contents are spliced into the prompt text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Image {
        name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
    Text {
        name: String,
        content: String,
    },
}

impl Attachment {
    /// Read and classify a file from disk. The mime type is guessed from the extension.
    pub fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path).first_or_octet_stream();

        // Reject before reading so a stray binary path doesn't get slurped
        if !is_supported(mime_type.essence_str()) {
            return Err(AttachmentError::Unsupported {
                name,
                mime_type: mime_type.essence_str().to_string(),
            });
        }

        let bytes = fs::read(path).map_err(|source| AttachmentError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_bytes(&name, mime_type.essence_str(), bytes)
    }

    /// Classify in-memory file data by mime type
    pub fn from_bytes(name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<Self, AttachmentError> {
        if mime_type.starts_with("image/") {
            Ok(Attachment::Image {
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                bytes,
            })
        } else if mime_type == "text/plain" {
            Ok(Attachment::Text {
                name: name.to_string(),
                content: String::from_utf8_lossy(&bytes).into_owned(),
            })
        } else {
            Err(AttachmentError::Unsupported {
                name: name.to_string(),
                mime_type: mime_type.to_string(),
            })
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Attachment::Image { name, .. } | Attachment::Text { name, .. } => name,
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            Attachment::Image { mime_type, .. } => mime_type,
            Attachment::Text { .. } => "text/plain",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Attachment::Image { .. })
    }
}

fn is_supported(mime_type: &str) -> bool {
    mime_type.starts_with("image/") || mime_type == "text/plain"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_classifies_images() {
        let attachment = Attachment::from_bytes("logo.png", "image/png", vec![0x89, 0x50]).unwrap();
        assert!(attachment.is_image());
        assert_eq!(attachment.mime_type(), "image/png");
        assert_eq!(attachment.name(), "logo.png");
    }

    #[test]
    fn test_classifies_text_and_decodes() {
        let attachment =
            Attachment::from_bytes("notes.txt", "text/plain", b"dark theme please".to_vec()).unwrap();
        assert_eq!(
            attachment,
            Attachment::Text {
                name: "notes.txt".to_string(),
                content: "dark theme please".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_other_types() {
        let err = Attachment::from_bytes("spec.pdf", "application/pdf", Vec::new()).unwrap_err();
        assert!(matches!(err, AttachmentError::Unsupported { .. }));
        assert!(err.to_string().contains("application/pdf"));
    }

    #[test]
    fn test_from_path_reads_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brief.txt");
        let mut file = fs::File::create(&path).unwrap();
        write!(file, "A bakery site").unwrap();

        let attachment = Attachment::from_path(&path).unwrap();
        assert_eq!(attachment.name(), "brief.txt");
        assert!(matches!(attachment, Attachment::Text { ref content, .. } if content == "A bakery site"));
    }

    #[test]
    fn test_from_path_reads_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mockup.jpg");
        fs::write(&path, [0xff, 0xd8, 0xff]).unwrap();

        let attachment = Attachment::from_path(&path).unwrap();
        assert_eq!(attachment.mime_type(), "image/jpeg");
        assert!(matches!(attachment, Attachment::Image { ref bytes, .. } if bytes.len() == 3));
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Attachment::from_path(&dir.path().join("gone.txt")).unwrap_err();
        assert!(matches!(err, AttachmentError::Io { .. }));
    }

    #[test]
    fn test_from_path_rejects_unknown_extension_without_reading() {
        let err = Attachment::from_path(Path::new("/definitely/not/here.bin")).unwrap_err();
        assert!(matches!(err, AttachmentError::Unsupported { .. }));
    }
}
