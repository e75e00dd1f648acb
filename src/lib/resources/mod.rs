//! Module handling the resources used for rendering captions.

mod filesystem;
mod fonts;


pub use self::filesystem::{BytesLoader, FileLoader, PathLoader};
pub use self::fonts::{Font, FontError, FontLoader, FILE_EXTENSION as FONT_FILE_EXTENSION};


use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};


/// Loader of resources from some external source.
pub trait Loader {
    /// Type of resources that this loader can load.
    type Item;
    /// Error that may occur while loading the resource.
    type Err;

    /// Load a resource of given name.
    fn load<'n>(&self, name: &'n str) -> Result<Self::Item, Self::Err>;
}


/// A loader that keeps the resources it has loaded successfully.
///
/// Failures are not remembered, so a resource that has been fixed
/// on disk will be picked up on the next attempt.
pub struct CachingLoader<L: Loader> {
    inner: L,
    cache: RwLock<HashMap<String, Arc<L::Item>>>,
}

impl<L: Loader> CachingLoader<L> {
    #[inline]
    pub fn new(inner: L) -> Self {
        CachingLoader{inner, cache: RwLock::new(HashMap::new())}
    }

    #[inline]
    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Number of resources currently kept.
    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl<L: Loader> Loader for CachingLoader<L> {
    type Item = Arc<L::Item>;
    type Err = L::Err;

    /// Load the object from cache or fall back on the wrapped Loader.
    fn load<'n>(&self, name: &'n str) -> Result<Self::Item, Self::Err> {
        if let Ok(cache) = self.cache.read() {
            if let Some(obj) = cache.get(name) {
                return Ok(obj.clone());
            }
        }
        let obj = Arc::new(self.inner.load(name)?);
        match self.cache.write() {
            Ok(mut cache) => {
                let cached = cache.entry(name.to_owned()).or_insert(obj);
                Ok(cached.clone())
            }
            Err(_) => {
                warn!("Resource cache poisoned, `{}` will not be kept", name);
                Ok(obj)
            }
        }
    }
}

impl<L: Loader + fmt::Debug> fmt::Debug for CachingLoader<L> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("CachingLoader")
            .field("inner", &self.inner)
            .field("len", &self.len())
            .finish()
    }
}
