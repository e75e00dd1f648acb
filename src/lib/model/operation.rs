//! Module defining the operations and their arguments.

use std::fmt;
use std::str::FromStr;

use image::ImageFormat;
use serde::de::DeserializeOwned;
use serde_json::Value as Json;
use thiserror::Error;

use super::constants::{MAX_BLUR, MAX_CAPTION_LENGTH, MAX_SCALE};


/// Image operation that can be invoked by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    /// Blur the image.
    Blur,
    /// Resize the image by a scale factor.
    Resize,
    /// Rotate the image by an angle (in degrees).
    Rotate,
    /// Convert the image to another format.
    Convert,
    /// Render meme captions onto the image.
    MemeGenerate,
}

const OPERATIONS: &[Operation] = &[
    Operation::Blur,
    Operation::Resize,
    Operation::Rotate,
    Operation::Convert,
    Operation::MemeGenerate,
];

impl Operation {
    /// Iterate over all the operations.
    #[inline]
    pub fn iter_variants() -> impl Iterator<Item=Operation> {
        OPERATIONS.iter().cloned()
    }

    /// Name under which the operation is invoked.
    pub fn name(&self) -> &'static str {
        match *self {
            Operation::Blur => "blur",
            Operation::Resize => "resize",
            Operation::Rotate => "rotate",
            Operation::Convert => "convert",
            Operation::MemeGenerate => "memeGenerate",
        }
    }

    /// Names of the operation's parameters,
    /// in the order they are expected when given positionally.
    pub fn params(&self) -> &'static [&'static str] {
        lazy_static! {
            static ref PARAMS: ::std::collections::HashMap<Operation, &'static [&'static str]> = hashmap!{
                Operation::Blur => &["amount", "url"] as &[_],
                Operation::Resize => &["scale", "url"] as &[_],
                Operation::Rotate => &["angle", "url"] as &[_],
                Operation::Convert => &["fileExt", "url"] as &[_],
                Operation::MemeGenerate => &["topText", "bottomText", "url"] as &[_],
            };
        }
        PARAMS[self]
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.name())
    }
}

impl FromStr for Operation {
    type Err = UnknownOperation;

    /// Parse the operation name.
    ///
    /// Matching is case-insensitive and ignores underscores,
    /// so both `memeGenerate` and `meme_generate` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalize = |s: &str| s.trim().replace('_', "").to_lowercase();
        let wanted = normalize(s);
        Operation::iter_variants()
            .find(|op| normalize(op.name()) == wanted)
            .ok_or_else(|| UnknownOperation(s.to_owned()))
    }
}

/// Error for when an operation name doesn't match any `Operation`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown operation `{0}`")]
pub struct UnknownOperation(pub String);


/// Arguments of the blur operation.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BlurArgs {
    pub amount: f64,
    pub url: String,
}

/// Arguments of the resize operation.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ResizeArgs {
    /// Scale as a fraction, e.g. 0.5 for 50%.
    pub scale: f64,
    pub url: String,
}

/// Arguments of the rotate operation.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RotateArgs {
    /// Angle in degrees. Positive values rotate clockwise.
    pub angle: f64,
    pub url: String,
}

/// Arguments of the convert operation.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConvertArgs {
    /// Extension of the target format, e.g. `"png"`.
    #[serde(alias = "file_ext")]
    pub file_ext: String,
    pub url: String,
}

/// Arguments of the meme generation operation.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemeArgs {
    #[serde(alias = "top_text")]
    pub top_text: String,
    #[serde(alias = "bottom_text")]
    pub bottom_text: String,
    pub url: String,
}


/// A single invocation of an `Operation` together with its arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Blur(BlurArgs),
    Resize(ResizeArgs),
    Rotate(RotateArgs),
    Convert(ConvertArgs),
    MemeGenerate(MemeArgs),
}

impl Call {
    /// Decode the call of given operation from a source of its arguments.
    pub fn decode<S: ArgsSource>(op: Operation, source: S) -> Result<Self, S::Error> {
        Ok(match op {
            Operation::Blur => Call::Blur(source.args()?),
            Operation::Resize => Call::Resize(source.args()?),
            Operation::Rotate => Call::Rotate(source.args()?),
            Operation::Convert => Call::Convert(source.args()?),
            Operation::MemeGenerate => Call::MemeGenerate(source.args()?),
        })
    }

    #[inline]
    pub fn operation(&self) -> Operation {
        match *self {
            Call::Blur(..) => Operation::Blur,
            Call::Resize(..) => Operation::Resize,
            Call::Rotate(..) => Operation::Rotate,
            Call::Convert(..) => Operation::Convert,
            Call::MemeGenerate(..) => Operation::MemeGenerate,
        }
    }

    /// URL of the source image.
    #[inline]
    pub fn url(&self) -> &str {
        match *self {
            Call::Blur(ref a) => &a.url,
            Call::Resize(ref a) => &a.url,
            Call::Rotate(ref a) => &a.url,
            Call::Convert(ref a) => &a.url,
            Call::MemeGenerate(ref a) => &a.url,
        }
    }
}

impl Call {
    /// Check the arguments before anything gets downloaded.
    pub fn validate(&self) -> Result<(), ArgumentError> {
        if self.url().trim().is_empty() {
            return Err(ArgumentError::EmptyUrl);
        }
        match *self {
            Call::Blur(ref a) => {
                let amount = finite("amount", a.amount)?;
                if amount < 0.0 || amount > MAX_BLUR {
                    return Err(ArgumentError::OutOfRange{
                        param: "amount", value: amount, range: format!("[0, {}]", MAX_BLUR)});
                }
            }
            Call::Resize(ref a) => {
                let scale = finite("scale", a.scale)?;
                if scale <= 0.0 || scale > MAX_SCALE {
                    return Err(ArgumentError::OutOfRange{
                        param: "scale", value: scale, range: format!("(0, {}]", MAX_SCALE)});
                }
            }
            Call::Rotate(ref a) => { finite("angle", a.angle)?; }
            Call::Convert(ref a) => { target_format(&a.file_ext)?; }
            Call::MemeGenerate(ref a) => {
                for text in &[&a.top_text, &a.bottom_text] {
                    let len = text.chars().count();
                    if len > MAX_CAPTION_LENGTH {
                        return Err(ArgumentError::CaptionTooLong(len));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Resolve the image format that a file extension refers to.
///
/// Only formats that can actually be written are accepted.
fn target_format(ext: &str) -> Result<ImageFormat, ArgumentError> {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ArgumentError::UnknownFormat(ext.to_owned()));
    }
    match ImageFormat::from_extension(ext) {
        Some(format) if WRITABLE_FORMATS.contains(&format) => Ok(format),
        _ => Err(ArgumentError::UnknownFormat(ext.to_owned())),
    }
}

/// Formats with an encoder among the enabled `image` features.
const WRITABLE_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::Bmp,
    ImageFormat::Ico,
    ImageFormat::Tiff,
    ImageFormat::Tga,
    ImageFormat::Pnm,
];

fn finite(param: &'static str, value: f64) -> Result<f64, ArgumentError> {
    if value.is_finite() { Ok(value) } else { Err(ArgumentError::NotFinite(param)) }
}


/// Error for invalid operation arguments.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ArgumentError {
    /// Source image URL is empty.
    #[error("source image URL is empty")]
    EmptyUrl,
    /// Numeric parameter is NaN or infinite.
    #[error("parameter `{0}` must be a finite number")]
    NotFinite(&'static str),
    /// Numeric parameter outside of its allowed range.
    #[error("parameter `{param}` = {value} is outside of the allowed range {range}")]
    OutOfRange { param: &'static str, value: f64, range: String },
    /// Target file extension doesn't name a writable image format.
    #[error("unsupported target image format `{0}`")]
    UnknownFormat(String),
    /// Caption text too long.
    #[error("caption text too long: {} > {}", .0, MAX_CAPTION_LENGTH)]
    CaptionTooLong(usize),
}


/// Source of operation arguments, like a JSON value or a query string.
pub trait ArgsSource {
    /// Error that may occur while decoding the arguments.
    type Error;

    /// Decode the arguments structure.
    fn args<T: DeserializeOwned>(self) -> Result<T, Self::Error>;
}

/// JSON arguments can be either an object with named parameters,
/// or an array of positional ones.
impl ArgsSource for Json {
    type Error = serde_json::Error;

    fn args<T: DeserializeOwned>(self) -> Result<T, Self::Error> {
        serde_json::from_value(self)
    }
}

impl<'j> ArgsSource for &'j Json {
    type Error = serde_json::Error;

    fn args<T: DeserializeOwned>(self) -> Result<T, Self::Error> {
        T::deserialize(self)
    }
}


#[cfg(test)]
mod tests {
    use spectral::prelude::*;
    use super::*;

    #[test]
    fn operation_names_roundtrip() {
        for op in Operation::iter_variants() {
            assert_that!(op.name().parse::<Operation>()).is_ok().is_equal_to(op);
        }
    }

    #[test]
    fn operation_name_variants() {
        assert_that!("memeGenerate".parse::<Operation>()).is_ok().is_equal_to(Operation::MemeGenerate);
        assert_that!("meme_generate".parse::<Operation>()).is_ok().is_equal_to(Operation::MemeGenerate);
        assert_that!("MEMEGENERATE".parse::<Operation>()).is_ok().is_equal_to(Operation::MemeGenerate);
        assert_that!(" Blur ".parse::<Operation>()).is_ok().is_equal_to(Operation::Blur);
        assert_that!("sharpen".parse::<Operation>()).is_err()
            .is_equal_to(UnknownOperation("sharpen".into()));
        assert_that!("".parse::<Operation>()).is_err();
    }

    #[test]
    fn every_operation_has_url_param_last() {
        for op in Operation::iter_variants() {
            assert_eq!(Some(&"url"), op.params().last(), "{}", op);
        }
    }

    #[test]
    fn validate_ok() {
        assert_that!(blur(2.5).validate()).is_ok();
        assert_that!(blur(0.0).validate()).is_ok();
        assert_that!(resize(0.5).validate()).is_ok();
        assert_that!(rotate(-45.0).validate()).is_ok();
        assert_that!(convert("png").validate()).is_ok();
        assert_that!(convert(".JPG").validate()).is_ok();
    }

    #[test]
    fn validate_empty_url() {
        let call = Call::Blur(BlurArgs{amount: 1.0, url: "  ".into()});
        assert_that!(call.validate()).is_err().is_equal_to(ArgumentError::EmptyUrl);
    }

    #[test]
    fn validate_numbers() {
        assert_that!(blur(-1.0).validate()).is_err();
        assert_that!(blur(1000.0).validate()).is_err();
        assert_that!(blur(::std::f64::NAN).validate()).is_err()
            .is_equal_to(ArgumentError::NotFinite("amount"));
        assert_that!(resize(0.0).validate()).is_err();
        assert_that!(resize(-0.5).validate()).is_err();
        assert_that!(resize(100.0).validate()).is_err();
        assert_that!(rotate(::std::f64::INFINITY).validate()).is_err()
            .is_equal_to(ArgumentError::NotFinite("angle"));
    }

    #[test]
    fn validate_format() {
        assert_that!(convert("").validate()).is_err();
        assert_that!(convert("docx").validate()).is_err();
        assert_that!(convert("png -write /etc/passwd").validate()).is_err();
        assert_that!(convert("../png").validate()).is_err();
    }

    #[test]
    fn validate_caption_length() {
        let long = "x".repeat(MAX_CAPTION_LENGTH + 1);
        let call = Call::MemeGenerate(MemeArgs{
            top_text: "ok".into(), bottom_text: long, url: "http://example.com/a.png".into()});
        assert_that!(call.validate()).is_err()
            .is_equal_to(ArgumentError::CaptionTooLong(MAX_CAPTION_LENGTH + 1));
    }

    fn blur(amount: f64) -> Call {
        Call::Blur(BlurArgs{amount, url: "http://example.com/a.png".into()})
    }
    fn resize(scale: f64) -> Call {
        Call::Resize(ResizeArgs{scale, url: "http://example.com/a.png".into()})
    }
    fn rotate(angle: f64) -> Call {
        Call::Rotate(RotateArgs{angle, url: "http://example.com/a.png".into()})
    }
    fn convert(ext: &str) -> Call {
        Call::Convert(ConvertArgs{file_ext: ext.into(), url: "http://example.com/a.png".into()})
    }
}
