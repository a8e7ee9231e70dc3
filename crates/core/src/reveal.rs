//! The char-by-char reveal of an assistant reply.

/// The state of a [`Reveal`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RevealState {
    /// No reply has been started.
    #[default]
    Idle,
    /// Chars of `source` before the byte offset `position` are visible.
    Revealing {
        /// Byte offset of the next char to reveal.
        position: usize,
        /// The full reply text.
        source: String,
    },
    /// All chars of the last source have been revealed.
    Done,
}

/// A timer-driven state machine that discloses a reply one char per tick.
///
/// The machine does not know about time, the owner decides how long to
/// wait between two ticks.
#[derive(Clone, Debug, Default)]
pub struct Reveal {
    state: RevealState,
}

impl Reveal {
    /// Starts revealing `source` from the beginning.
    ///
    /// Any reveal in progress is discarded.
    pub fn start<S: Into<String>>(&mut self, source: S) {
        self.state = RevealState::Revealing {
            position: 0,
            source: source.into(),
        };
    }

    /// Advances the machine by one step.
    ///
    /// Returns the newly revealed char, or `None` if there is nothing left.
    /// The tick that finds the source exhausted moves the state to
    /// [`RevealState::Done`].
    pub fn tick(&mut self) -> Option<char> {
        let RevealState::Revealing { position, source } = &mut self.state
        else {
            return None;
        };

        let next = source[*position..].chars().next();
        match next {
            Some(ch) => {
                *position += ch.len_utf8();
                Some(ch)
            }
            None => {
                self.state = RevealState::Done;
                None
            }
        }
    }

    /// Stops the reveal, leaving the state idle.
    #[inline]
    pub fn reset(&mut self) {
        self.state = RevealState::Idle;
    }

    /// Returns `true` while chars are still being revealed.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.state, RevealState::Revealing { .. })
    }

    /// Returns the part of the source that is already visible.
    pub fn visible(&self) -> &str {
        match &self.state {
            RevealState::Revealing { position, source } => &source[..*position],
            RevealState::Idle | RevealState::Done => "",
        }
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> &RevealState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(reveal: &mut Reveal) -> String {
        let mut out = String::new();
        while let Some(ch) = reveal.tick() {
            out.push(ch);
            assert_eq!(reveal.visible(), out);
        }
        out
    }

    #[test]
    fn test_reveal_in_order() {
        let mut reveal = Reveal::default();
        assert_eq!(reveal.tick(), None);
        assert_eq!(reveal.state(), &RevealState::Idle);

        reveal.start("hi");
        assert!(reveal.is_active());
        assert_eq!(reveal.tick(), Some('h'));
        assert_eq!(
            reveal.state(),
            &RevealState::Revealing {
                position: 1,
                source: "hi".to_owned()
            }
        );
        assert_eq!(reveal.tick(), Some('i'));
        assert!(reveal.is_active());
        assert_eq!(reveal.tick(), None);
        assert_eq!(reveal.state(), &RevealState::Done);
        assert_eq!(reveal.tick(), None);
    }

    #[test]
    fn test_multibyte_source() {
        let mut reveal = Reveal::default();
        reveal.start("你好, wörld 👋");
        assert_eq!(drain(&mut reveal), "你好, wörld 👋");
        assert_eq!(reveal.state(), &RevealState::Done);
    }

    #[test]
    fn test_empty_source_finishes_on_first_tick() {
        let mut reveal = Reveal::default();
        reveal.start("");
        assert!(reveal.is_active());
        assert_eq!(reveal.tick(), None);
        assert_eq!(reveal.state(), &RevealState::Done);
    }

    #[test]
    fn test_restart_and_reset() {
        let mut reveal = Reveal::default();
        reveal.start("abc");
        reveal.tick();
        reveal.start("xy");
        assert_eq!(drain(&mut reveal), "xy");

        reveal.start("zzz");
        reveal.reset();
        assert!(!reveal.is_active());
        assert_eq!(reveal.visible(), "");
    }
}
