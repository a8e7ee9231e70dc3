use std::future::pending;
use std::time::Duration;

use chatllm_model::{PromptMessage, ReplyRequest};
use tokio::select;
use tokio::sync::{mpsc, watch};
use tokio::time::{MissedTickBehavior, interval};

use super::{ChatSnapshot, Command};
use crate::config::ChatConfig;
use crate::reply_client::{BoxedResolveFuture, ReplyClient};
use crate::session::{ChatSession, RevealProgress, SendOutcome, TurnPhase};
use crate::transcript::Entry;

type EntryObserver = Box<dyn Fn(usize, &Entry) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Observers {
    pub on_entry_changed: Option<EntryObserver>,
    pub on_typing_changed: Option<Box<dyn Fn(bool) + Send + Sync>>,
    pub on_idle: Option<Box<dyn Fn() + Send + Sync>>,
}

pub(crate) struct ChatState {
    session: ChatSession,
    reply_client: ReplyClient,
    config: ChatConfig,
    observers: Observers,
    typing_shown: bool,
}

#[derive(Debug)]
enum Event {
    Command(Command),
    ReplyResolved(String),
    Tick,
}

// `interval` panics on a zero period.
const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

pub(crate) async fn run_chat(
    mut state: ChatState,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    mut kill_rx: watch::Receiver<bool>,
) {
    debug!("started");

    let mut ticker = interval(state.config.reveal_delay.max(MIN_TICK_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pending_reply: Option<BoxedResolveFuture> = None;

    loop {
        let event = select! {
            biased;

            _ = kill_rx.changed() => {
                break;
            }
            source = wait_reply(&mut pending_reply) => {
                pending_reply = None;
                Event::ReplyResolved(source)
            }
            _ = ticker.tick(), if state.session.is_revealing() => {
                Event::Tick
            }
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    break;
                };
                Event::Command(cmd)
            }
        };
        trace!("handling event: {event:?}");

        match event {
            Event::Command(cmd) => state.handle_command(cmd),
            Event::ReplyResolved(source) => {
                state.begin_reveal(source);
                // The first char shows up right away.
                ticker.reset_immediately();
            }
            Event::Tick => state.step(),
        }

        if pending_reply.is_none()
            && state.session.phase() == TurnPhase::AwaitingReply
        {
            pending_reply = Some(state.request_reply());
        }
        state.sync_typing();
    }

    if state.session.is_typing() {
        debug!("dropping the turn in flight");
        state.session.abort();
    }
    debug!("will terminate");
}

async fn wait_reply(fut: &mut Option<BoxedResolveFuture>) -> String {
    match fut {
        Some(fut) => fut.await,
        None => pending().await,
    }
}

impl ChatState {
    pub fn new(
        reply_client: ReplyClient,
        config: ChatConfig,
        observers: Observers,
    ) -> Self {
        Self {
            session: ChatSession::default(),
            reply_client,
            config,
            observers,
            typing_shown: false,
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SetDraftText(text) => {
                self.session.draft_mut().set_text(text);
            }
            Command::AttachImage(image) => {
                self.session.draft_mut().attach_image(image);
            }
            Command::DetachImage => {
                self.session.draft_mut().detach_image();
            }
            Command::Send => self.send(),
            Command::Snapshot(tx) => {
                tx.send(self.snapshot()).ok();
            }
        }
    }

    fn send(&mut self) {
        let appended_from = self.session.transcript().len();
        let outcome = self.session.send();
        debug!("send: {outcome:?}");
        match outcome {
            SendOutcome::Ignored => {}
            SendOutcome::Queued => {
                debug!("{} send(s) waiting", self.session.queued_len());
            }
            SendOutcome::AwaitingReply => {
                self.notify_appended(appended_from);
            }
            SendOutcome::Completed => {
                self.notify_appended(appended_from);
                self.advance_queue();
            }
        }
    }

    /// Commits queued sends until one needs a reply, or reports idle if
    /// nothing is left.
    fn advance_queue(&mut self) {
        loop {
            let appended_from = self.session.transcript().len();
            let Some(outcome) = self.session.commit_next_queued() else {
                break;
            };
            self.notify_appended(appended_from);
            if outcome == SendOutcome::AwaitingReply {
                return;
            }
        }

        if !self.session.is_typing() {
            // Hide the indicator before telling anyone we are idle.
            self.sync_typing();
            if let Some(on_idle) = &self.observers.on_idle {
                on_idle();
            }
        }
    }

    fn request_reply(&self) -> BoxedResolveFuture {
        let mut messages = vec![];
        if !self.config.system_prompt.is_empty() {
            messages.push(PromptMessage::System(
                self.config.system_prompt.clone(),
            ));
        }
        messages.extend(self.session.prompt_history());
        self.reply_client.resolve(ReplyRequest { messages })
    }

    fn begin_reveal(&mut self, source: String) {
        trace!("revealing {} char(s)", source.chars().count());
        if !self.session.begin_reveal(source) {
            warn!("got a reply, but no turn is waiting for it");
        }
    }

    fn step(&mut self) {
        match self.session.step() {
            RevealProgress::Advanced => {
                let last = self.session.transcript().len() - 1;
                self.notify_changed(last);
            }
            RevealProgress::Finished => {
                debug!("reveal finished");
                self.advance_queue();
            }
            RevealProgress::Inactive => {}
        }
    }

    fn sync_typing(&mut self) {
        let typing = self.session.is_typing();
        if typing == self.typing_shown {
            return;
        }
        self.typing_shown = typing;
        if let Some(on_typing_changed) = &self.observers.on_typing_changed {
            on_typing_changed(typing);
        }
    }

    fn notify_appended(&self, from: usize) {
        for index in from..self.session.transcript().len() {
            self.notify_changed(index);
        }
    }

    fn notify_changed(&self, index: usize) {
        let Some(on_entry_changed) = &self.observers.on_entry_changed else {
            return;
        };
        if let Some(entry) = self.session.transcript().get(index) {
            on_entry_changed(index, entry);
        }
    }

    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            entries: self.session.transcript().entries().to_vec(),
            typing: self.session.is_typing(),
            draft: self.session.draft().clone(),
            queued: self.session.queued_len(),
        }
    }
}
