//! Transcript-related types.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// An opaque reference to an image, usually a content URI handed out by
/// the host's image picker.
///
/// The chat core never resolves the reference, it only carries it from
/// the draft to the transcript entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Creates a new image reference.
    #[inline]
    pub fn new<S: Into<String>>(uri: S) -> Self {
        Self(uri.into())
    }

    /// Returns the underlying URI.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ImageRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who produced an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// The local user.
    User,
    /// The assistant.
    Assistant,
}

/// The payload of an entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// A single image.
    Image {
        /// The image.
        image: ImageRef,
    },
    /// Text with an attached image.
    TextAndImage {
        /// The text.
        text: String,
        /// The image.
        image: ImageRef,
    },
}

impl Content {
    /// Creates a text content.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        Content::Text { text: text.into() }
    }

    /// Creates an image content.
    #[inline]
    pub fn image(image: ImageRef) -> Self {
        Content::Image { image }
    }

    /// Creates a text with image content.
    #[inline]
    pub fn text_and_image<S: Into<String>>(text: S, image: ImageRef) -> Self {
        Content::TextAndImage {
            text: text.into(),
            image,
        }
    }

    /// Returns the text part, if this content has one.
    pub fn text_part(&self) -> Option<&str> {
        match self {
            Content::Text { text } | Content::TextAndImage { text, .. } => {
                Some(text)
            }
            Content::Image { .. } => None,
        }
    }

    /// Returns the image part, if this content has one.
    pub fn image_part(&self) -> Option<&ImageRef> {
        match self {
            Content::Image { image }
            | Content::TextAndImage { image, .. } => Some(image),
            Content::Text { .. } => None,
        }
    }

    /// Returns a mutable reference to the text part.
    pub(crate) fn text_part_mut(&mut self) -> Option<&mut String> {
        match self {
            Content::Text { text } | Content::TextAndImage { text, .. } => {
                Some(text)
            }
            Content::Image { .. } => None,
        }
    }
}

/// An item in the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Who produced this entry.
    pub origin: Origin,
    /// What this entry shows.
    pub content: Content,
}

impl Entry {
    /// Creates a user entry.
    #[inline]
    pub fn user(content: Content) -> Self {
        Self {
            origin: Origin::User,
            content,
        }
    }

    /// Creates an assistant entry.
    #[inline]
    pub fn assistant(content: Content) -> Self {
        Self {
            origin: Origin::Assistant,
            content,
        }
    }

    /// Returns `true` if the entry was produced by the user.
    #[inline]
    pub fn is_user(&self) -> bool {
        self.origin == Origin::User
    }
}

/// The ordered list of entries for one chat.
///
/// Insertion order is display order. Entries can only be appended, or the
/// last one overwritten while the assistant reply is being revealed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    /// Appends an entry to the end.
    #[inline]
    pub fn append(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Overwrites the last entry, returning the previous one.
    ///
    /// Returns `None` and leaves the transcript untouched if it is empty.
    pub fn replace_last(&mut self, entry: Entry) -> Option<Entry> {
        let last = self.entries.last_mut()?;
        Some(std::mem::replace(last, entry))
    }

    /// Returns all entries in display order.
    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the entry at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// Returns the last entry.
    #[inline]
    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_append_and_replace_last() {
        let mut transcript = Transcript::default();
        let entry = Entry::user(Content::text("x"));
        assert_eq!(transcript.replace_last(entry), None);
        assert!(transcript.is_empty());

        transcript.append(Entry::user(Content::text("hi")));
        transcript.append(Entry::assistant(Content::text("")));
        let old = transcript
            .replace_last(Entry::assistant(Content::text("h")))
            .unwrap();

        assert_eq!(old, Entry::assistant(Content::text("")));
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.get(0), Some(&Entry::user(Content::text("hi"))));
        assert_eq!(
            transcript.last(),
            Some(&Entry::assistant(Content::text("h")))
        );
    }

    #[test]
    fn test_content_parts() {
        let image = ImageRef::new("content://media/1");
        let text = Content::text("hello");
        let picture = Content::image(image.clone());
        let both = Content::text_and_image("look", image.clone());

        assert_eq!(text.text_part(), Some("hello"));
        assert_eq!(text.image_part(), None);
        assert_eq!(picture.text_part(), None);
        assert_eq!(picture.image_part(), Some(&image));
        assert_eq!(both.text_part(), Some("look"));
        assert_eq!(both.image_part(), Some(&image));
    }

    #[test]
    fn test_export_shape() {
        let mut transcript = Transcript::default();
        transcript.append(Entry::user(Content::text_and_image(
            "see this",
            ImageRef::new("content://media/7"),
        )));
        transcript.append(Entry::assistant(Content::text("nice")));

        let value = serde_json::to_value(&transcript).unwrap();
        assert_eq!(
            value,
            json!([
                {
                    "origin": "user",
                    "content": {
                        "type": "text_and_image",
                        "text": "see this",
                        "image": "content://media/7"
                    }
                },
                {
                    "origin": "assistant",
                    "content": { "type": "text", "text": "nice" }
                }
            ])
        );
    }
}
