//! "Save as" targets for downloaded files.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

/// Name used when the suggested one has nothing usable left.
const FALLBACK_FILE_NAME: &str = "download";

/// Receives the bytes of a finished download.
pub trait DownloadSink: Send + Sync {
    /// Persist `contents` under (a sanitised form of) `suggested_name` and
    /// return where it ended up.
    fn save(&self, suggested_name: &str, contents: &[u8]) -> io::Result<PathBuf>;
}

/// Saves downloads into a directory, never overwriting an existing file.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The user's download directory, or the working directory if there is none.
    pub fn default_location() -> Self {
        Self::new(dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Candidate paths for `name`: `name`, then `stem (1).ext`, `stem (2).ext`...
    fn candidates(&self, name: &str) -> impl Iterator<Item = PathBuf> + '_ {
        let (stem, ext) = match name.rfind('.') {
            Some(idx) if idx > 0 => (name[..idx].to_string(), name[idx..].to_string()),
            _ => (name.to_string(), String::new()),
        };
        std::iter::once(self.dir.join(name)).chain(
            (1..).map(move |n| self.dir.join(format!("{} ({}){}", stem, n, ext))),
        )
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, suggested_name: &str, contents: &[u8]) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let name = sanitize_file_name(suggested_name);

        // create_new makes claiming a name atomic, so concurrent saves of the
        // same name each land in their own file.
        for path in self.candidates(&name) {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(contents)?;
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("No free file name for {}", name),
        ))
    }
}

/// Reduce a suggested name to a bare file name with no directory parts.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .replace(|c: char| c.is_control(), "");

    match base.as_str() {
        "" | "." | ".." => FALLBACK_FILE_NAME.to_string(),
        _ => base,
    }
}
