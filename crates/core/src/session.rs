use std::collections::VecDeque;

use chatllm_model::PromptMessage;

use crate::draft::Draft;
use crate::reveal::Reveal;
use crate::transcript::{Content, Entry, Transcript};

/// What the session is doing with the current turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TurnPhase {
    /// Nothing in flight.
    #[default]
    Idle,
    /// The assistant placeholder is appended and a reply source is needed.
    AwaitingReply,
    /// The reply is being revealed into the last entry.
    Revealing,
}

/// The result of [`ChatSession::send`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SendOutcome {
    /// The draft was blank, nothing happened.
    Ignored,
    /// Another turn is in flight, the draft is queued and cleared.
    Queued,
    /// Both entries are appended and the turn is already complete.
    Completed,
    /// Both entries are appended, the caller should now pick a reply source
    /// and call [`ChatSession::begin_reveal`].
    AwaitingReply,
}

/// The result of [`ChatSession::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RevealProgress {
    /// One more char is visible in the last entry.
    Advanced,
    /// The reply is fully revealed and the last entry is frozen.
    Finished,
    /// No reveal is running.
    Inactive,
}

/// The state of one chat screen: transcript, draft, and the turn in flight.
///
/// This type is fully synchronous. Something else (see [`crate::Chat`])
/// decides when to call [`ChatSession::step`] and where the reply source
/// comes from.
///
/// Sends issued while a turn is in flight are queued and committed in order
/// once the current reveal finishes, so only the last assistant entry is
/// ever mutable.
#[derive(Clone, Debug, Default)]
pub struct ChatSession {
    transcript: Transcript,
    draft: Draft,
    reveal: Reveal,
    phase: TurnPhase,
    queued: VecDeque<Content>,
}

impl ChatSession {
    /// Returns the transcript.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the draft.
    #[inline]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Returns the draft for editing.
    #[inline]
    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    /// Returns the phase of the current turn.
    #[inline]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Returns `true` while the typing indicator should be shown.
    #[inline]
    pub fn is_typing(&self) -> bool {
        self.phase != TurnPhase::Idle
    }

    /// Returns `true` while chars are being revealed.
    #[inline]
    pub fn is_revealing(&self) -> bool {
        self.phase == TurnPhase::Revealing
    }

    /// Returns the number of sends waiting for the current turn.
    #[inline]
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Sends the draft.
    pub fn send(&mut self) -> SendOutcome {
        let Some(content) = self.draft.take_content() else {
            return SendOutcome::Ignored;
        };
        if self.phase != TurnPhase::Idle {
            self.queued.push_back(content);
            return SendOutcome::Queued;
        }
        self.commit(content)
    }

    /// Commits the oldest queued send, if the session is idle.
    pub fn commit_next_queued(&mut self) -> Option<SendOutcome> {
        if self.phase != TurnPhase::Idle {
            return None;
        }
        let content = self.queued.pop_front()?;
        Some(self.commit(content))
    }

    fn commit(&mut self, content: Content) -> SendOutcome {
        debug_assert_eq!(self.phase, TurnPhase::Idle);
        let reply = match &content {
            Content::Text { .. } => Content::text(""),
            Content::Image { image } => Content::image(image.clone()),
            Content::TextAndImage { image, .. } => {
                Content::text_and_image("", image.clone())
            }
        };
        let needs_reply = content.text_part().is_some();

        self.transcript.append(Entry::user(content));
        self.transcript.append(Entry::assistant(reply));

        if needs_reply {
            self.phase = TurnPhase::AwaitingReply;
            SendOutcome::AwaitingReply
        } else {
            SendOutcome::Completed
        }
    }

    /// Builds the text history for the reply provider.
    ///
    /// Contains every turn's text, oldest first, ending with the user text
    /// of the turn awaiting a reply. Entries without text are skipped.
    pub fn prompt_history(&self) -> Vec<PromptMessage> {
        let entries = self.transcript.entries();
        let entries = match self.phase {
            // Don't include the empty placeholder.
            TurnPhase::AwaitingReply => &entries[..entries.len() - 1],
            TurnPhase::Idle | TurnPhase::Revealing => entries,
        };
        entries
            .iter()
            .filter_map(|entry| {
                let text = entry.content.text_part()?;
                if entry.is_user() {
                    Some(PromptMessage::User(text.to_owned()))
                } else if !text.is_empty() {
                    Some(PromptMessage::Assistant(text.to_owned()))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Starts revealing `source` into the assistant placeholder.
    ///
    /// Returns `false` if no turn is awaiting a reply.
    pub fn begin_reveal<S: Into<String>>(&mut self, source: S) -> bool {
        if self.phase != TurnPhase::AwaitingReply {
            return false;
        }
        self.reveal.start(source);
        self.phase = TurnPhase::Revealing;
        true
    }

    /// Reveals the next char of the reply.
    pub fn step(&mut self) -> RevealProgress {
        if self.phase != TurnPhase::Revealing {
            return RevealProgress::Inactive;
        }
        let Some(ch) = self.reveal.tick() else {
            self.reveal.reset();
            self.phase = TurnPhase::Idle;
            return RevealProgress::Finished;
        };

        let Some(mut entry) = self.transcript.last().cloned() else {
            unreachable!("revealing without a placeholder");
        };
        match entry.content.text_part_mut() {
            Some(text) => text.push(ch),
            None => unreachable!("placeholder has no text: {entry:?}"),
        }
        self.transcript.replace_last(entry);
        RevealProgress::Advanced
    }

    /// Stops the turn in flight and drops queued sends.
    ///
    /// The last entry keeps whatever has been revealed so far.
    pub fn abort(&mut self) {
        self.reveal.reset();
        self.phase = TurnPhase::Idle;
        self.queued.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::ImageRef;

    fn send_text(session: &mut ChatSession, text: &str) -> SendOutcome {
        session.draft_mut().set_text(text);
        session.send()
    }

    fn finish_reveal(session: &mut ChatSession) -> usize {
        let mut steps = 0;
        while session.step() == RevealProgress::Advanced {
            steps += 1;
        }
        steps
    }

    #[test]
    fn test_text_send() {
        let mut session = ChatSession::default();
        assert_eq!(send_text(&mut session, "hi"), SendOutcome::AwaitingReply);

        assert_eq!(
            session.transcript().entries(),
            &[
                Entry::user(Content::text("hi")),
                Entry::assistant(Content::text("")),
            ]
        );
        assert_eq!(session.draft(), &Draft::default());
        assert!(session.is_typing());
        assert!(!session.is_revealing());

        assert!(session.begin_reveal("hi"));
        assert!(session.is_revealing());
        assert_eq!(finish_reveal(&mut session), 2);
        assert_eq!(
            session.transcript().last(),
            Some(&Entry::assistant(Content::text("hi")))
        );
        assert!(!session.is_typing());
        assert_eq!(session.step(), RevealProgress::Inactive);
    }

    #[test]
    fn test_blank_send_is_noop() {
        let mut session = ChatSession::default();
        assert_eq!(send_text(&mut session, "   "), SendOutcome::Ignored);
        assert!(session.transcript().is_empty());
        assert_eq!(session.draft().text(), "   ");
        assert!(!session.is_typing());
    }

    #[test]
    fn test_image_send_completes_immediately() {
        let mut session = ChatSession::default();
        let image = ImageRef::new("content://media/42");
        session.draft_mut().attach_image(image.clone());

        assert_eq!(session.send(), SendOutcome::Completed);
        let entries = session.transcript().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], Entry::user(Content::image(image.clone())));
        assert_eq!(entries[1], Entry::assistant(Content::image(image)));
        assert!(!session.is_typing());
        assert!(!session.begin_reveal("nope"));
        assert_eq!(session.draft().image(), None);
    }

    #[test]
    fn test_text_and_image_send() {
        let mut session = ChatSession::default();
        let image = ImageRef::new("content://media/9");
        session.draft_mut().set_text("what is this?");
        session.draft_mut().attach_image(image.clone());

        assert_eq!(session.send(), SendOutcome::AwaitingReply);
        assert_eq!(
            session.transcript().last(),
            Some(&Entry::assistant(Content::text_and_image("", image.clone())))
        );

        session.begin_reveal("a cat");
        finish_reveal(&mut session);
        let entries = session.transcript().entries();
        assert_eq!(entries[0].content.image_part(), Some(&image));
        assert_eq!(
            entries[1],
            Entry::assistant(Content::text_and_image("a cat", image))
        );
    }

    #[test]
    fn test_each_step_rewrites_last_entry() {
        let mut session = ChatSession::default();
        send_text(&mut session, "abc");
        session.begin_reveal("xyz");

        let mut seen = vec![];
        while session.step() == RevealProgress::Advanced {
            let text = session.transcript().last().unwrap().content.text_part();
            seen.push(text.unwrap().to_owned());
        }
        assert_eq!(seen, ["x", "xy", "xyz"]);
        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn test_sends_are_queued_while_busy() {
        let mut session = ChatSession::default();
        send_text(&mut session, "first");
        assert_eq!(send_text(&mut session, "second"), SendOutcome::Queued);
        assert_eq!(session.draft().text(), "");
        assert_eq!(session.queued_len(), 1);
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.commit_next_queued(), None);

        session.begin_reveal("one");
        assert_eq!(send_text(&mut session, "third"), SendOutcome::Queued);
        finish_reveal(&mut session);

        assert_eq!(
            session.commit_next_queued(),
            Some(SendOutcome::AwaitingReply)
        );
        assert_eq!(
            session.transcript().get(2),
            Some(&Entry::user(Content::text("second")))
        );
        assert_eq!(session.queued_len(), 1);
    }

    #[test]
    fn test_prompt_history() {
        let mut session = ChatSession::default();
        send_text(&mut session, "hello");
        assert_eq!(
            session.prompt_history(),
            [PromptMessage::User("hello".to_owned())]
        );
        session.begin_reveal("hey");
        finish_reveal(&mut session);

        session
            .draft_mut()
            .attach_image(ImageRef::new("content://media/1"));
        session.send();

        session.draft_mut().set_text("and now?");
        session.send();
        assert_eq!(
            session.prompt_history(),
            [
                PromptMessage::User("hello".to_owned()),
                PromptMessage::Assistant("hey".to_owned()),
                PromptMessage::User("and now?".to_owned()),
            ]
        );
    }

    #[test]
    fn test_abort_freezes_partial_reply() {
        let mut session = ChatSession::default();
        send_text(&mut session, "long");
        session.begin_reveal("partial");
        session.step();
        session.step();
        send_text(&mut session, "later");

        session.abort();
        assert!(!session.is_typing());
        assert_eq!(session.queued_len(), 0);
        assert_eq!(session.step(), RevealProgress::Inactive);
        assert_eq!(
            session.transcript().last(),
            Some(&Entry::assistant(Content::text("pa")))
        );
    }
}
