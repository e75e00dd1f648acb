//! Blob store retrieving images over HTTP
//! and publishing results to a directory or an HTTP endpoint.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use url::Url;

use crate::context::Context;
use super::{BlobStore, FetchError, UploadError, DEFAULT_MAX_SIZE};
use super::naming::{mime_type, sanitize_name};


/// Number of leading bytes used to recognize the image format.
const SNIFF_LENGTH: usize = 64;


/// Options for retrieving source images.
#[derive(Clone, Debug)]
pub struct FetchOptions {
    /// Timeout of a single HTTP request, if any.
    pub timeout: Option<Duration>,
    /// Maximum size of a retrieved file.
    pub max_size: u64,
    /// Whether `file://` URLs are accepted.
    pub allow_local_files: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions{
            timeout: Some(Duration::from_secs(30)),
            max_size: DEFAULT_MAX_SIZE,
            allow_local_files: false,
        }
    }
}


/// Where the results are published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadTarget {
    /// Files are copied to `<root>/<task id>/` and served under `<base_url>/<task id>/`.
    Directory { root: PathBuf, base_url: String },
    /// Files are sent with `PUT <endpoint>/<task id>/<file>`.
    Http { endpoint: String },
}


/// Blob store talking HTTP.
#[derive(Debug)]
pub struct HttpBlobStore {
    client: Client,
    options: FetchOptions,
    target: UploadTarget,
}

impl HttpBlobStore {
    pub fn new(target: UploadTarget, options: FetchOptions) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpBlobStore{client, options, target})
    }

    #[inline]
    pub fn target(&self) -> &UploadTarget {
        &self.target
    }

    #[inline]
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }
}

impl BlobStore for HttpBlobStore {
    fn download(&self, url: &str, ctx: &Context) -> Result<PathBuf, FetchError> {
        let start = Instant::now();
        let parsed = Url::parse(url.trim())
            .map_err(|e| FetchError::InvalidUrl(url.to_owned(), e))?;
        let name = file_name(&parsed);
        let path = ctx.path_for(&name);
        trace!("Downloading {} into {}", parsed, path.display());

        let size = match parsed.scheme() {
            "http" | "https" => self.fetch_http(&parsed, &path)?,
            "file" if self.options.allow_local_files => self.fetch_file(&parsed, &path)?,
            scheme => return Err(FetchError::UnsupportedScheme(scheme.to_owned())),
        };

        let path = ensure_image_extension(path)?;
        debug!("Downloaded {} ({} bytes) to {} in {:?}",
            parsed, size, path.display(), start.elapsed());
        Ok(path)
    }

    fn upload(&self, path: &Path, ctx: &Context) -> Result<String, UploadError> {
        let name = path.file_name().and_then(|n| n.to_str())
            .ok_or_else(|| UploadError::InvalidName(path.to_owned()))?;
        let url = match self.target {
            UploadTarget::Directory{ref root, ref base_url} => {
                let dir = root.join(ctx.id());
                fs::create_dir_all(&dir)?;
                fs::copy(path, dir.join(name))?;
                format!("{}/{}/{}", base_url.trim_end_matches('/'), ctx.id(), name)
            }
            UploadTarget::Http{ref endpoint} => self.put(endpoint, path, name, ctx)?,
        };
        debug!("Uploaded {} as {}", path.display(), url);
        Ok(url)
    }
}

impl HttpBlobStore {
    fn fetch_http(&self, url: &Url, path: &Path) -> Result<u64, FetchError> {
        let response = self.client.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            warn!("Fetching {} failed with {}", url, status);
            return Err(FetchError::Status(status));
        }
        if let Some(len) = response.content_length() {
            if len > self.options.max_size {
                return Err(FetchError::TooLarge(self.options.max_size));
            }
        }
        self.write_limited(response, path)
    }

    fn fetch_file(&self, url: &Url, path: &Path) -> Result<u64, FetchError> {
        let source = url.to_file_path()
            .map_err(|_| FetchError::UnsupportedScheme(url.scheme().to_owned()))?;
        let file = File::open(&source)?;
        if file.metadata()?.len() > self.options.max_size {
            return Err(FetchError::TooLarge(self.options.max_size));
        }
        self.write_limited(file, path)
    }

    /// Copy the content to a file, up to the size limit.
    fn write_limited<R: Read>(&self, reader: R, path: &Path) -> Result<u64, FetchError> {
        let max_size = self.options.max_size;
        let mut file = File::create(path)?;
        let copied = io::copy(&mut reader.take(max_size + 1), &mut file)?;
        if copied > max_size {
            return Err(FetchError::TooLarge(max_size));
        }
        file.flush()?;
        Ok(copied)
    }

    fn put(&self, endpoint: &str, path: &Path, name: &str, ctx: &Context) -> Result<String, UploadError> {
        let raw = format!("{}/{}/{}", endpoint.trim_end_matches('/'), ctx.id(), name);
        let url = Url::parse(&raw).map_err(|e| UploadError::InvalidUrl(raw.clone(), e))?;

        let response = self.client.put(url.clone())
            .header(CONTENT_TYPE, mime_type(path).as_ref())
            .body(File::open(path)?)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            warn!("Uploading to {} failed with {}", url, status);
            return Err(UploadError::Status(status));
        }
        let location = response.headers().get(LOCATION)
            .and_then(|l| l.to_str().ok())
            .and_then(|l| url.join(l).ok());
        Ok(location.unwrap_or(url).into())
    }
}


/// Name of the working file for the image at given URL.
fn file_name(url: &Url) -> String {
    let last = url.path_segments()
        .and_then(|s| s.filter(|s| !s.is_empty()).last())
        .map(|s| percent_decode(s))
        .unwrap_or_default();
    sanitize_name(&last)
}

fn percent_decode(s: &str) -> String {
    let escaped = s.replace('+', "%2B").replace('&', "%26");
    url::form_urlencoded::parse(format!("x={}", escaped).as_bytes())
        .next().map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| s.to_owned())
}

/// Make sure the file has an extension of the image format it contains.
///
/// The format is recognized from content. Only when that fails
/// (e.g. for TGA, which has no signature) is a known extension trusted.
fn ensure_image_extension(path: PathBuf) -> Result<PathBuf, FetchError> {
    let mut head = Vec::with_capacity(SNIFF_LENGTH);
    File::open(&path)?.take(SNIFF_LENGTH as u64).read_to_end(&mut head)?;
    let format = match image::guess_format(&head) {
        Ok(format) => format,
        Err(_) if image::ImageFormat::from_path(&path).is_ok() => return Ok(path),
        Err(_) => return Err(FetchError::UnknownFormat),
    };

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let extensions = format.extensions_str();
    if extensions.iter().any(|x| x.eq_ignore_ascii_case(extension)) {
        return Ok(path);
    }
    let ext = extensions.first().ok_or(FetchError::UnknownFormat)?;

    // Keep the name, replacing an image extension that lies about the content.
    let stem = match image::ImageFormat::from_path(&path) {
        Ok(_) => path.file_stem(),
        Err(_) => path.file_name(),
    };
    let stem = stem.and_then(|n| n.to_str()).unwrap_or("image");
    let renamed = path.with_file_name(format!("{}.{}", stem, ext));
    trace!("Recognized {:?} content, renaming {} to {}",
        format, path.display(), renamed.display());
    fs::rename(&path, &renamed)?;
    Ok(renamed)
}
