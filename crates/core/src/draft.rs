//! The pending input of a chat.

use serde::{Deserialize, Serialize};

use crate::transcript::{Content, ImageRef};

/// The pending input of a chat: the text box and an optional attached
/// image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    text: String,
    image: Option<ImageRef>,
}

impl Draft {
    /// Returns the draft text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the attached image.
    #[inline]
    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    /// Replaces the draft text.
    #[inline]
    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.text = text.into();
    }

    /// Attaches an image, replacing the previous one.
    #[inline]
    pub fn attach_image(&mut self, image: ImageRef) {
        self.image = Some(image);
    }

    /// Removes the attached image.
    #[inline]
    pub fn detach_image(&mut self) -> Option<ImageRef> {
        self.image.take()
    }

    /// Returns `true` if sending this draft would produce a turn.
    #[inline]
    pub fn is_sendable(&self) -> bool {
        self.has_text() || self.image.is_some()
    }

    #[inline]
    fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Takes the draft out as user content, clearing both text and image.
    ///
    /// Returns `None` and leaves the draft untouched if it's not sendable.
    /// Blank text next to an image is dropped.
    pub(crate) fn take_content(&mut self) -> Option<Content> {
        if !self.is_sendable() {
            return None;
        }
        let has_text = self.has_text();
        let text = std::mem::take(&mut self.text);
        let content = match (has_text, self.image.take()) {
            (true, Some(image)) => Content::text_and_image(text, image),
            (false, Some(image)) => Content::image(image),
            (true, None) => Content::text(text),
            (false, None) => unreachable!("checked by `is_sendable`"),
        };
        Some(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_draft_is_kept() {
        let mut draft = Draft::default();
        draft.set_text(" \t\n\u{3000}");
        assert!(!draft.is_sendable());
        assert_eq!(draft.take_content(), None);
        assert_eq!(draft.text(), " \t\n\u{3000}");
    }

    #[test]
    fn test_take_content_variants() {
        let image = ImageRef::new("content://media/3");

        let mut draft = Draft::default();
        draft.set_text("  padded  ");
        assert_eq!(draft.take_content(), Some(Content::text("  padded  ")));
        assert_eq!(draft, Draft::default());

        draft.set_text("   ");
        draft.attach_image(image.clone());
        assert_eq!(draft.take_content(), Some(Content::image(image.clone())));
        assert_eq!(draft, Draft::default());

        draft.set_text("caption");
        draft.attach_image(image.clone());
        assert_eq!(
            draft.take_content(),
            Some(Content::text_and_image("caption", image))
        );
        assert_eq!(draft, Draft::default());
    }

    #[test]
    fn test_detach_image() {
        let mut draft = Draft::default();
        draft.attach_image(ImageRef::new("a"));
        draft.attach_image(ImageRef::new("b"));
        assert_eq!(draft.detach_image(), Some(ImageRef::new("b")));
        assert!(!draft.is_sendable());
    }
}
