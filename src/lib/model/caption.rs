//! Module implementing the `Caption` type.

use std::fmt;


/// Vertical placement of a caption on the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    /// Flush with the top edge.
    Top,
    /// Flush with the bottom edge.
    Bottom,
}


/// Describes a single piece of text rendered on a meme image.
///
/// The text is always kept in upper case, regardless of the input.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Caption {
    text: String,
    valign: VAlign,
}

impl Caption {
    /// Create a Caption with a text at the particular vertical alignment.
    #[inline]
    pub fn text_at<S: AsRef<str>>(valign: VAlign, s: S) -> Self {
        Caption{text: s.as_ref().to_uppercase(), valign}
    }

    #[inline]
    pub fn top<S: AsRef<str>>(s: S) -> Self {
        Self::text_at(VAlign::Top, s)
    }

    #[inline]
    pub fn bottom<S: AsRef<str>>(s: S) -> Self {
        Self::text_at(VAlign::Bottom, s)
    }
}

impl Caption {
    /// Text to render (upper-cased).
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn valign(&self) -> VAlign {
        self.valign
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Debug for Caption {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{valign:?}({text:?})", valign = self.valign, text = self.text)
    }
}
