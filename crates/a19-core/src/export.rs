//! Packaging the current artifact: a three-file zip download and a single
//! self-contained preview document.

use std::fs::{self, File};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::state::GeneratedArtifact;

pub const ARCHIVE_NAME: &str = "website.zip";
pub const PREVIEW_NAME: &str = "preview.html";
pub const HTML_FILE: &str = "index.html";
pub const CSS_FILE: &str = "style.css";
pub const JS_FILE: &str = "script.js";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// The three source files of a website, without the explanation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFiles {
    pub html: String,
    pub css: String,
    pub javascript: String,
}

impl From<&GeneratedArtifact> for SourceFiles {
    fn from(artifact: &GeneratedArtifact) -> Self {
        Self {
            html: artifact.html.clone(),
            css: artifact.css.clone(),
            javascript: artifact.javascript.clone(),
        }
    }
}

/// File names paired with their contents, in archive order
pub fn bundle_entries(artifact: &GeneratedArtifact) -> [(&'static str, &str); 3] {
    [
        (HTML_FILE, artifact.html.as_str()),
        (CSS_FILE, artifact.css.as_str()),
        (JS_FILE, artifact.javascript.as_str()),
    ]
}

pub fn write_archive<W: Write + Seek>(artifact: &GeneratedArtifact, writer: W) -> Result<W, ExportError> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, contents) in bundle_entries(artifact) {
        zip.start_file(name, options)?;
        zip.write_all(contents.as_bytes())?;
    }

    Ok(zip.finish()?)
}

/// Write `website.zip` into `dir`, creating the directory if needed
pub fn save_archive(artifact: &GeneratedArtifact, dir: &Path) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(ARCHIVE_NAME);
    let file = File::create(&path)?;
    write_archive(artifact, file)?;
    info!(path = %path.display(), "saved website archive");
    Ok(path)
}

/// Read the source files back out of an archive written by [`write_archive`].
/// Missing entries come back empty.
pub fn read_archive<R: Read + Seek>(reader: R) -> Result<SourceFiles, ExportError> {
    let mut archive = ZipArchive::new(reader)?;
    let mut read_entry = |name: &str| -> Result<String, ExportError> {
        match archive.by_name(name) {
            Ok(mut entry) => {
                let mut contents = String::new();
                entry.read_to_string(&mut contents)?;
                Ok(contents)
            }
            Err(zip::result::ZipError::FileNotFound) => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    };

    Ok(SourceFiles {
        html: read_entry(HTML_FILE)?,
        css: read_entry(CSS_FILE)?,
        javascript: read_entry(JS_FILE)?,
    })
}

/// Compose markup, styles and script into one document for a sandboxed preview
pub fn preview_document(artifact: &GeneratedArtifact) -> String {
    format!(
        "<html>\n  <head>\n    <style>{}</style>\n  </head>\n  <body>\n    {}\n    <script>{}</script>\n  </body>\n</html>\n",
        artifact.css, artifact.html, artifact.javascript
    )
}

pub fn save_preview(artifact: &GeneratedArtifact, dir: &Path) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(PREVIEW_NAME);
    fs::write(&path, preview_document(artifact))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn artifact() -> GeneratedArtifact {
        GeneratedArtifact {
            html: "<main>\n  <h1>Caf\u{e9}</h1>\n</main>".to_string(),
            css: "h1 {\n  color: #333;\n}\n".to_string(),
            javascript: "document.querySelector('h1').onclick = () => alert(\"hi\");".to_string(),
            explanation: "A cafe page".to_string(),
        }
    }

    #[test]
    fn test_archive_reproduces_sources() {
        let artifact = artifact();
        let cursor = write_archive(&artifact, Cursor::new(Vec::new())).unwrap();

        let files = read_archive(Cursor::new(cursor.into_inner())).unwrap();

        assert_eq!(files, SourceFiles::from(&artifact));
    }

    #[test]
    fn test_archive_entry_names() {
        let cursor = write_archive(&artifact(), Cursor::new(Vec::new())).unwrap();
        let archive = ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec![HTML_FILE, JS_FILE, CSS_FILE]);
    }

    #[test]
    fn test_empty_script_survives() {
        let mut artifact = artifact();
        artifact.javascript.clear();
        let cursor = write_archive(&artifact, Cursor::new(Vec::new())).unwrap();

        let files = read_archive(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(files.javascript, "");
        assert_eq!(files.html, artifact.html);
    }

    #[test]
    fn test_save_archive_to_new_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("exports");

        let path = save_archive(&artifact(), &target).unwrap();

        assert_eq!(path, target.join(ARCHIVE_NAME));
        let files = read_archive(File::open(&path).unwrap()).unwrap();
        assert_eq!(files.css, artifact().css);
    }

    #[test]
    fn test_preview_document_layout() {
        let doc = preview_document(&artifact());
        let style = doc.find("<style>h1 {").unwrap();
        let body = doc.find("<h1>Caf\u{e9}</h1>").unwrap();
        let script = doc.find("<script>document.querySelector").unwrap();
        assert!(style < body && body < script);
        assert!(doc.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_save_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_preview(&artifact(), dir.path()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), preview_document(&artifact()));
    }
}
