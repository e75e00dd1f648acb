//! Loaders of resources stored as files in a directory.
//!
//! A resource is named by the file stem, so `Impact` refers to `<dir>/Impact.ttf`.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use glob::{self, Pattern};

use super::Loader;


/// Resolves resource names into paths of files from a directory.
///
/// Optionally only files with certain extensions are considered.
#[derive(Clone, Debug)]
pub struct PathLoader {
    directory: PathBuf,
    /// Accepted extensions, lowercase. Empty means any.
    extensions: Vec<String>,
}

impl PathLoader {
    #[inline]
    pub fn new<D: AsRef<Path>>(directory: D) -> Self {
        Self::for_extensions(directory, Vec::<String>::new())
    }

    #[inline]
    pub fn for_extension<D: AsRef<Path>, S: AsRef<str>>(directory: D, extension: S) -> Self {
        Self::for_extensions(directory, vec![extension])
    }

    pub fn for_extensions<D, I, S>(directory: D, extensions: I) -> Self
        where D: AsRef<Path>, I: IntoIterator<Item=S>, S: AsRef<str>
    {
        PathLoader{
            directory: directory.as_ref().to_owned(),
            extensions: extensions.into_iter()
                .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    #[inline]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Names of all the resources in the directory, sorted.
    pub fn names(&self) -> io::Result<Vec<String>> {
        let mut names: Vec<_> = self.files_matching("*")?.into_iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_owned))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Files in the directory whose name matches given (unescaped) glob pattern
    /// and which have one of the accepted extensions.
    fn files_matching(&self, file_pattern: &str) -> io::Result<Vec<PathBuf>> {
        let directory = self.directory.to_str().ok_or_else(|| io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("non UTF-8 resource directory {}", self.directory.display())))?;
        let pattern = format!("{}/{}", Pattern::escape(directory.trim_end_matches('/')), file_pattern);
        trace!("Globbing with {}", pattern);

        let paths = glob::glob(&pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        Ok(paths
            .filter_map(|r| r.map_err(|e| warn!("Skipping unreadable path: {}", e)).ok())
            .filter(|p| p.is_file() && self.accepts(p))
            .collect())
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension().and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

impl Loader for PathLoader {
    type Item = PathBuf;
    type Err = io::Error;

    fn load<'n>(&self, name: &'n str) -> Result<PathBuf, io::Error> {
        if name.is_empty() || name.contains(|c| c == '/' || c == '\\') {
            return Err(io::Error::new(io::ErrorKind::InvalidInput,
                format!("invalid resource name `{}`", name)));
        }
        // Names are literal, never glob patterns.
        let escaped = format!("{}.*", Pattern::escape(name));
        let mut found = self.files_matching(&escaped)?;
        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err(io::Error::new(io::ErrorKind::NotFound, format!(
                "no resource `{}` in {}", name, self.directory.display()))),
            n => Err(io::Error::new(io::ErrorKind::InvalidInput, format!(
                "resource name `{}` is ambiguous: {} files in {}",
                name, n, self.directory.display()))),
        }
    }
}


/// Opens the resource files resolved by a `PathLoader`.
#[derive(Clone, Debug)]
pub struct FileLoader {
    paths: PathLoader,
}

impl FileLoader {
    #[inline]
    pub fn new<D: AsRef<Path>>(directory: D) -> Self {
        PathLoader::new(directory).into()
    }

    #[inline]
    pub fn for_extension<D: AsRef<Path>, S: AsRef<str>>(directory: D, extension: S) -> Self {
        PathLoader::for_extension(directory, extension).into()
    }

    #[inline]
    pub fn paths(&self) -> &PathLoader {
        &self.paths
    }
}

impl From<PathLoader> for FileLoader {
    fn from(paths: PathLoader) -> Self {
        FileLoader{paths}
    }
}

impl Loader for FileLoader {
    type Item = File;
    type Err = io::Error;

    fn load<'n>(&self, name: &'n str) -> Result<File, io::Error> {
        File::open(self.paths.load(name)?)
    }
}


/// Reads the whole content of resource files.
#[derive(Clone, Debug)]
pub struct BytesLoader {
    files: FileLoader,
}

impl BytesLoader {
    #[inline]
    pub fn new(files: FileLoader) -> Self {
        BytesLoader{files}
    }

    #[inline]
    pub fn files(&self) -> &FileLoader {
        &self.files
    }
}

impl From<FileLoader> for BytesLoader {
    fn from(files: FileLoader) -> Self {
        BytesLoader::new(files)
    }
}

impl Loader for BytesLoader {
    type Item = Vec<u8>;
    type Err = io::Error;

    fn load<'n>(&self, name: &'n str) -> Result<Vec<u8>, io::Error> {
        let path = self.files.paths().load(name)?;
        let bytes = fs::read(&path)?;
        trace!("Read {} bytes of resource `{}` from {}", bytes.len(), name, path.display());
        Ok(bytes)
    }
}


#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::{self, Read};
    use spectral::prelude::*;
    use tempfile::{self, TempDir};
    use super::{BytesLoader, FileLoader, Loader, PathLoader};

    fn scratch(files: &[&str]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            fs::write(dir.path().join(f), f.as_bytes()).unwrap();
        }
        dir
    }

    #[test]
    fn path_loader_by_extension() {
        let dir = scratch(&["Impact.ttf", "Impact.txt", "Other.otf", "Loud.TTF"]);
        let loader = PathLoader::for_extension(dir.path(), "ttf");
        assert_that!(loader.load("Impact")).is_ok()
            .is_equal_to(dir.path().join("Impact.ttf"));
        assert_that!(loader.load("Loud")).is_ok();
        assert_eq!(io::ErrorKind::NotFound, loader.load("Other").unwrap_err().kind());
        assert_that!(loader.names()).is_ok()
            .is_equal_to(vec!["Impact".to_owned(), "Loud".to_owned()]);
    }

    #[test]
    fn path_loader_ambiguous() {
        let dir = scratch(&["foo.png", "foo.jpg"]);
        let loader = PathLoader::new(dir.path());
        assert_eq!(io::ErrorKind::InvalidInput, loader.load("foo").unwrap_err().kind());
    }

    #[test]
    fn path_loader_rejects_patterns_and_paths() {
        let dir = scratch(&["foo.ttf"]);
        let loader = PathLoader::new(dir.path());
        assert_that!(loader.load("*")).is_err();
        assert_that!(loader.load("f?o")).is_err();
        assert_that!(loader.load("../foo")).is_err();
        assert_that!(loader.load("")).is_err();
    }

    #[test]
    fn file_and_bytes_loaders() {
        let dir = scratch(&["data.bin"]);

        let mut content = String::new();
        FileLoader::new(dir.path()).load("data").unwrap()
            .read_to_string(&mut content).unwrap();
        assert_eq!("data.bin", content);

        let loader = BytesLoader::new(FileLoader::new(dir.path()));
        assert_that!(loader.load("data")).is_ok().is_equal_to(b"data.bin".to_vec());
    }
}
