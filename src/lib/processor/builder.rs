//! Module implementing the builder for `Processor`.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error as ThisError;

use crate::blob::BlobStore;
use crate::model::constants::DEFAULT_FONT;
use crate::resources::{CachingLoader, FontLoader};
use crate::transform::{Backend, RasterTransform};
use super::{Inner, Processor};


/// Builder for `Processor`.
#[must_use = "unused builder which must be used"]
pub struct Builder {
    errors: Vec<Error>,

    font_directory: Option<PathBuf>,
    font: Option<String>,
    backend: Option<Backend>,
    transform: Option<Box<dyn RasterTransform>>,
    blob_store: Option<Box<dyn BlobStore>>,
    work_directory: Option<PathBuf>,
}

impl Builder {
    /// Create a new `Builder`.
    #[inline]
    pub fn new() -> Self {
        Builder::default()
    }
}
impl Default for Builder {
    fn default() -> Self {
        Builder{
            errors: vec![],
            font_directory: None,
            font: None,
            backend: None,
            transform: None,
            blob_store: None,
            work_directory: None,
        }
    }
}

// Setters.
impl Builder {
    /// Set the directory where the fonts will be loaded from.
    #[inline]
    pub fn font_directory<P: AsRef<Path>>(mut self, directory: P) -> Self {
        self.font_directory = Some(directory.as_ref().to_owned()); self
    }

    /// Set the name of the font used for captions.
    #[inline]
    pub fn font<S: Into<String>>(mut self, name: S) -> Self {
        let name = name.into();
        if name.trim().is_empty() {
            return self.err(Error::Invalid("font name cannot be empty".into()));
        }
        self.font = Some(name); self
    }

    /// Choose one of the standard raster transform backends.
    #[inline]
    pub fn backend(mut self, backend: Backend) -> Self {
        if self.transform.is_some() {
            return self.err(Error::transform_setup_conflict());
        }
        self.backend = Some(backend); self
    }

    /// Set a custom raster transform implementation.
    #[inline]
    pub fn transform<T: RasterTransform + 'static>(mut self, transform: T) -> Self {
        if self.backend.is_some() {
            return self.err(Error::transform_setup_conflict());
        }
        self.transform = Some(Box::new(transform)); self
    }

    /// Set the storage where source images come from and results go to.
    #[inline]
    pub fn blob_store<B: BlobStore + 'static>(mut self, store: B) -> Self {
        self.blob_store = Some(Box::new(store)); self
    }

    /// Set the directory where working directories of tasks are created.
    ///
    /// By default, the system's temporary directory is used.
    #[inline]
    pub fn work_directory<P: AsRef<Path>>(mut self, directory: P) -> Self {
        self.work_directory = Some(directory.as_ref().to_owned()); self
    }
}

// Validation & building.
impl Builder {
    /// Build the `Processor`.
    pub fn build(self) -> Result<Processor, Error> {
        self.check_errors()?;

        let font_directory = self.font_directory
            .ok_or_else(|| Error::Missing("font directory".into()))?;
        let blob_store = self.blob_store
            .ok_or_else(|| Error::Missing("blob store".into()))?;
        let transform = match self.transform {
            Some(t) => t,
            None => {
                let backend = self.backend.unwrap_or_default();
                backend.create().map_err(|e| Error::Backend(backend, e.to_string()))?
            }
        };
        debug!("Using {} raster transform", transform.name());

        Ok(Processor::from(Inner{
            font_loader: CachingLoader::new(FontLoader::new(font_directory)),
            font: self.font.unwrap_or_else(|| DEFAULT_FONT.to_owned()),
            transform,
            blob_store,
            work_directory: self.work_directory,
        }))
    }

    #[doc(hidden)]
    fn check_errors(&self) -> Result<(), Error> {
        match self.errors.first() {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    #[doc(hidden)]
    fn err(mut self, error: Error) -> Self {
        self.errors.push(error); self
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Builder")
            .field("errors", &self.errors)
            .field("font_directory", &self.font_directory)
            .field("font", &self.font)
            .field("backend", &self.backend)
            .field("transform", &self.transform)
            .field("blob_store", &self.blob_store.as_ref().map(|_| "..."))
            .field("work_directory", &self.work_directory)
            .finish()
    }
}


/// Error that resulted from misconfiguration of the `Processor` via its `Builder`.
#[derive(Clone, Debug, ThisError, PartialEq)]
pub enum Error {
    /// Required part of the configuration is missing.
    #[error("no {0} configured")]
    Missing(String),
    /// Invalid configuration value.
    #[error("{0}")]
    Invalid(String),
    /// Mutually exclusive settings were combined.
    #[error("{0}")]
    Conflict(String),
    /// The transform backend could not be set up.
    #[error("cannot use `{0}` transform backend: {1}")]
    Backend(Backend, String),
}

impl Error {
    #[inline]
    fn transform_setup_conflict() -> Self {
        Error::Conflict("both a backend and a custom transform cannot be set".into())
    }
}


#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use spectral::prelude::*;
    use crate::blob::{FetchOptions, HttpBlobStore, UploadTarget};
    use crate::transform::{Backend, Native};
    use super::{Builder, Error};

    fn blobs() -> HttpBlobStore {
        let target = UploadTarget::Directory{root: PathBuf::from("/tmp/blobs"), base_url: "/blobs".into()};
        HttpBlobStore::new(target, FetchOptions::default()).unwrap()
    }

    #[test]
    fn defaults() {
        let processor = Builder::new().font_directory("fonts").blob_store(blobs()).build();
        assert_that!(processor).is_ok();
        let processor = processor.unwrap();
        assert_eq!("DejaVuSans-Bold", processor.font());
        assert_eq!("native", processor.transform_name());
    }

    #[test]
    fn custom_transform() {
        let processor = Builder::new()
            .font_directory(Path::new("fonts"))
            .font("Impact")
            .transform(Native::new())
            .blob_store(blobs())
            .build().unwrap();
        assert_eq!("Impact", processor.font());
    }

    #[test]
    fn missing_parts() {
        let result = Builder::new().blob_store(blobs()).build();
        assert_that!(result.map(|_| ())).is_err()
            .is_equal_to(Error::Missing("font directory".into()));
        let result = Builder::new().font_directory("fonts").build();
        assert_that!(result.map(|_| ())).is_err()
            .is_equal_to(Error::Missing("blob store".into()));
    }

    #[test]
    fn conflicts() {
        let result = Builder::new()
            .font_directory("fonts").blob_store(blobs())
            .backend(Backend::Native).transform(Native::new())
            .build();
        match result {
            Err(Error::Conflict(_)) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn empty_font_name() {
        let result = Builder::new().font_directory("fonts").blob_store(blobs()).font(" ").build();
        match result {
            Err(Error::Invalid(_)) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
