//! Wide string encodings used as memory types.
//!
//! UTF-8 values use [`String`] directly. UTF-16 and UTF-32 values are stored as their code units.

use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// A UTF-16 encoded string, stored as code units. Unpaired surrogates are permitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Utf16String(pub Vec<u16>);

/// A UTF-32 encoded string, stored as scalar values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Utf32String(pub Vec<char>);

impl Utf16String {
    /// Decode to UTF-8, replacing unpaired surrogates with U+FFFD.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.0)
    }

    /// The number of code units.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` iff there are no code units.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Utf32String {
    /// The number of scalar values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` iff there are no scalar values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Utf16String {
    fn from(value: &str) -> Self {
        Self(value.encode_utf16().collect())
    }
}

impl From<&str> for Utf32String {
    fn from(value: &str) -> Self {
        Self(value.chars().collect())
    }
}

impl Display for Utf16String {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        char::decode_utf16(self.0.iter().copied())
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .try_for_each(|c| write!(f, "{c}"))
    }
}

impl Display for Utf32String {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

/// The string memory types, viewed as text.
pub trait Text {
    /// The value as UTF-8 text.
    fn text(&self) -> Cow<'_, str>;

    /// Encode UTF-8 text as this type.
    fn from_text(text: &str) -> Self;
}

impl Text for String {
    fn text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }

    fn from_text(text: &str) -> Self {
        text.to_string()
    }
}

impl Text for Utf16String {
    fn text(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string_lossy())
    }

    fn from_text(text: &str) -> Self {
        text.into()
    }
}

impl Text for Utf32String {
    fn text(&self) -> Cow<'_, str> {
        Cow::Owned(self.0.iter().collect())
    }

    fn from_text(text: &str) -> Self {
        text.into()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transcode_non_ascii() {
        let wide = Utf16String::from("Ωmega 𝄞");
        assert_eq!(wide.0.len(), 8);
        assert_eq!(wide.text(), "Ωmega 𝄞");
        assert_eq!(Utf32String::from("Ωmega 𝄞").len(), 7);
        assert_eq!(Utf32String::from_text(&wide.text()).to_string(), "Ωmega 𝄞");
    }

    #[test]
    fn unpaired_surrogate_is_replaced() {
        let broken = Utf16String(vec![0x61, 0xD800, 0x62]);
        assert_eq!(broken.to_string_lossy(), "a\u{FFFD}b");
        assert_eq!(broken.to_string(), "a\u{FFFD}b");
    }
}
