//! Module for loading fonts used to render captions.

use std::fmt;
use std::io;
use std::ops::Deref;
use std::path::Path;

use rusttype;
use thiserror::Error;

use super::Loader;
use super::filesystem::{BytesLoader, FileLoader};


pub const FILE_EXTENSION: &'static str = "ttf";


/// Font that can be used to caption images.
#[derive(Clone)]
pub struct Font {
    name: String,
    inner: rusttype::Font<'static>,
}

impl Font {
    /// Parse a font from the content of a TrueType file.
    pub fn from_bytes<N: ToString>(name: N, bytes: Vec<u8>) -> Result<Self, FontError> {
        let inner = rusttype::Font::try_from_vec(bytes).ok_or(FontError::Invalid)?;
        Ok(Font{name: name.to_string(), inner})
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Deref for Font {
    type Target = rusttype::Font<'static>;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Font({:?})", self.name)
    }
}


/// Error while loading a font.
#[derive(Debug, Error)]
pub enum FontError {
    /// Font file is missing or cannot be read.
    #[error("cannot read font file: {0}")]
    Io(#[from] io::Error),
    /// File content is not a usable font.
    #[error("not a valid TrueType font")]
    Invalid,
}


/// Loader of fonts from a directory of `.ttf` files.
#[derive(Debug)]
pub struct FontLoader {
    inner: BytesLoader,
}

impl FontLoader {
    pub fn new<D: AsRef<Path>>(directory: D) -> Self {
        FontLoader{
            inner: BytesLoader::new(
                FileLoader::for_extension(directory, FILE_EXTENSION))
        }
    }

    #[inline]
    pub fn directory(&self) -> &Path {
        self.inner.files().paths().directory()
    }

    /// Names of the fonts available in the directory.
    #[inline]
    pub fn names(&self) -> io::Result<Vec<String>> {
        self.inner.files().paths().names()
    }
}

impl Loader for FontLoader {
    type Item = Font;
    type Err = FontError;

    fn load<'n>(&self, name: &'n str) -> Result<Font, Self::Err> {
        let bytes = self.inner.load(name)?;
        match Font::from_bytes(name, bytes) {
            Ok(font) => {
                debug!("Font `{}` loaded successfully", name);
                Ok(font)
            }
            Err(e) => {
                error!("File for `{}` font resource is not a valid font", name);
                Err(e)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use std::fs;
    use spectral::prelude::*;
    use tempfile;
    use crate::model::constants::DEFAULT_FONT;
    use super::{FontError, FontLoader, Loader};

    const FONT_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/fonts");

    #[test]
    fn bundled_font() {
        let loader = FontLoader::new(FONT_DIR);
        let font = loader.load(DEFAULT_FONT);
        assert_that!(font).is_ok().map(|f| &f.name).is_equal_to(DEFAULT_FONT.to_owned());
        assert!(loader.names().unwrap().contains(&DEFAULT_FONT.to_owned()));
    }

    #[test]
    fn missing_font() {
        let loader = FontLoader::new(FONT_DIR);
        match loader.load("Comic Sans") {
            Err(FontError::Io(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn corrupt_font() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Broken.ttf"), b"definitely not a font").unwrap();
        let loader = FontLoader::new(dir.path());
        match loader.load("Broken") {
            Err(FontError::Invalid) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
