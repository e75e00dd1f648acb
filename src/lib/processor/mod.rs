//! Module which defines the image processor performing the operations.

mod builder;

pub use self::builder::{Builder, Error as BuildError};


use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::blob::{output_name, BlobStore};
use crate::context::Context;
use crate::error::Error;
use crate::meme;
use crate::model::{Call, BlurArgs, ConvertArgs, MemeArgs, ResizeArgs, RotateArgs};
use crate::resources::{CachingLoader, Font, FontLoader, Loader};
use crate::transform::{RasterTransform, Transform, TransformError};


/// Image processor.
///
/// Every operation is performed synchronously in the calling thread,
/// from downloading the source image to uploading the result.
/// It is recommended to execute them in a separate thread.
///
/// *Note*: `Processor` implements `Clone`
/// by merely cloning a shared reference to the underlying object.
#[derive(Clone)]
pub struct Processor {
    inner: Arc<Inner>,
}

/// Shared state of the processor.
pub(super) struct Inner {
    pub font_loader: CachingLoader<FontLoader>,
    pub font: String,
    pub transform: Box<dyn RasterTransform>,
    pub blob_store: Box<dyn BlobStore>,
    pub work_directory: Option<PathBuf>,
}

impl From<Inner> for Processor {
    fn from(inner: Inner) -> Self {
        Processor{inner: Arc::new(inner)}
    }
}

impl Processor {
    /// Create a `Builder` for the processor.
    #[inline]
    pub fn builder() -> Builder {
        Builder::new()
    }
}

// Operations.
impl Processor {
    /// Perform an operation call, returning the URL of the result.
    pub fn call(&self, call: Call) -> Result<String, Error> {
        let op = call.operation();
        call.validate()?;

        let start = Instant::now();
        let ctx = self.context().map_err(TransformError::Io)?;
        debug!("Performing {} on {} as task {}", op, call.url(), ctx.id());

        let input = self.inner.blob_store.download(call.url(), &ctx)?;
        let output = match call {
            Call::Blur(BlurArgs{amount, ..}) =>
                self.transform(Transform::Blur(amount), &input, None, &ctx)?,
            Call::Resize(ResizeArgs{scale, ..}) =>
                self.transform(Transform::Resize(scale), &input, None, &ctx)?,
            Call::Rotate(RotateArgs{angle, ..}) =>
                self.transform(Transform::Rotate(angle), &input, None, &ctx)?,
            Call::Convert(ConvertArgs{ref file_ext, ..}) =>
                self.transform(Transform::Convert, &input, Some(file_ext.as_str()), &ctx)?,
            Call::MemeGenerate(MemeArgs{ref top_text, ref bottom_text, ..}) =>
                self.meme(&input, top_text, bottom_text, &ctx)?,
        };
        let url = self.inner.blob_store.upload(&output, &ctx)?;

        info!("Task {} ({}) finished in {:?}: {}", ctx.id(), op, start.elapsed(), url);
        Ok(url)
    }

    #[inline]
    pub fn blur<U: Into<String>>(&self, amount: f64, url: U) -> Result<String, Error> {
        self.call(Call::Blur(BlurArgs{amount, url: url.into()}))
    }

    #[inline]
    pub fn resize<U: Into<String>>(&self, scale: f64, url: U) -> Result<String, Error> {
        self.call(Call::Resize(ResizeArgs{scale, url: url.into()}))
    }

    #[inline]
    pub fn rotate<U: Into<String>>(&self, angle: f64, url: U) -> Result<String, Error> {
        self.call(Call::Rotate(RotateArgs{angle, url: url.into()}))
    }

    #[inline]
    pub fn convert<E, U>(&self, file_ext: E, url: U) -> Result<String, Error>
        where E: Into<String>, U: Into<String>
    {
        self.call(Call::Convert(ConvertArgs{file_ext: file_ext.into(), url: url.into()}))
    }

    #[inline]
    pub fn meme_generate<T, B, U>(&self, top_text: T, bottom_text: B, url: U) -> Result<String, Error>
        where T: Into<String>, B: Into<String>, U: Into<String>
    {
        self.call(Call::MemeGenerate(MemeArgs{
            top_text: top_text.into(),
            bottom_text: bottom_text.into(),
            url: url.into(),
        }))
    }
}

impl Processor {
    fn context(&self) -> io::Result<Context> {
        match self.inner.work_directory {
            Some(ref dir) => Context::in_directory(dir),
            None => Context::new(),
        }
    }

    fn transform(&self, transform: Transform, input: &Path, new_ext: Option<&str>,
                 ctx: &Context) -> Result<PathBuf, Error> {
        let output = ctx.path_for(&output_name(input, new_ext));
        trace!("Applying {} with {} backend", transform, self.inner.transform.name());
        self.inner.transform.apply(transform, input, &output)?;
        Ok(output)
    }

    fn meme(&self, input: &Path, top_text: &str, bottom_text: &str,
            ctx: &Context) -> Result<PathBuf, Error> {
        let font = self.load_font()?;
        let output = ctx.path_for(&output_name(input, None));
        let layout = meme::generate(input, &output, &font, top_text, bottom_text)?;
        trace!("Captions rendered with {:?}", layout);
        Ok(output)
    }

    fn load_font(&self) -> Result<Arc<Font>, Error> {
        let name = &self.inner.font;
        self.inner.font_loader.load(name).map_err(|e| Error::Font(name.clone(), e))
    }
}

// Managing resources.
impl Processor {
    /// Preemptively load the font used for captions.
    pub fn preload_font(&self) -> Result<(), Error> {
        self.load_font().map(|_| ())
    }

    /// Name of the font used for captions.
    #[inline]
    pub fn font(&self) -> &str {
        &self.inner.font
    }

    /// Names of the fonts available in the font directory.
    #[inline]
    pub fn font_names(&self) -> io::Result<Vec<String>> {
        self.inner.font_loader.inner().names()
    }

    /// Name of the raster transform implementation in use.
    #[inline]
    pub fn transform_name(&self) -> &str {
        self.inner.transform.name()
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Processor")
            .field("font_directory", &self.inner.font_loader.inner().directory())
            .field("font", &self.inner.font)
            .field("transform", &self.inner.transform)
            .field("work_directory", &self.inner.work_directory)
            .finish()
    }
}
