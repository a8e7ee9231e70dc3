//! A simple program demonstrates how to use `chatllm` as a library.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::process::ExitCode;
use std::time::Duration;

use chatllm::EnvConfig;
use chatllm::core::{Chat, Entry, ImageRef, Origin};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum ChatEvent {
    Idle,
    Entry(Entry),
}

/// A line typed by the user.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Dump,
    Detach,
    Image(&'a str),
    Text(&'a str),
}

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    debug!(mode = ?config.reply_mode, "starting chat");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let chat = config
        .chat_builder()
        .on_idle({
            let event_tx = event_tx.clone();
            move || {
                event_tx.send(ChatEvent::Idle).ok();
            }
        })
        .on_entry_changed({
            let event_tx = event_tx.clone();
            move |_, entry| {
                event_tx.send(ChatEvent::Entry(entry.clone())).ok();
            }
        })
        .build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    // One reader for the whole session, so buffered lines are not lost.
    let mut stdin = io::BufReader::new(io::stdin());

    'outer: loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut stdin).await else {
            break;
        };
        match parse_input(&line) {
            Input::Quit => break,
            Input::Dump => {
                dump(&chat).await;
                continue;
            }
            Input::Detach => {
                chat.detach_image();
                continue;
            }
            Input::Image(uri) => {
                chat.attach_image(ImageRef::new(uri));
                println!("{}📎 {}", BAR_CHAR.bright_yellow(), uri.dimmed());
                continue;
            }
            Input::Text(text) => chat.set_draft_text(text),
        }

        let Some(snapshot) = chat.snapshot().await else {
            break;
        };
        if !snapshot.draft.is_sendable() {
            continue;
        }
        chat.send();

        let mut progress_bar = Some(new_spinner(&progress_style));
        let mut printed = 0;
        let mut image = None;

        loop {
            if let Some(progress_bar) = &progress_bar {
                progress_bar.inc(1);
            }

            let sleep = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    event
                },
                _ = sleep => {
                    continue;
                }
            };

            match event {
                ChatEvent::Entry(entry) if entry.origin == Origin::User => {}
                ChatEvent::Entry(entry) => {
                    let text = entry.content.text_part();
                    if text == Some("") {
                        // Placeholder, still waiting for the reply.
                        continue;
                    }
                    // Finish the progress bar before printing anything else.
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                        print!("{}🤖 ", BAR_CHAR.bright_cyan());
                    }
                    if let Some(text) = text {
                        let delta = &text[printed..];
                        print!("{}", delta.bright_white());
                        printed = text.len();
                    }
                    image = entry.content.image_part().cloned();
                    std::io::stdout().flush().ok();
                }
                ChatEvent::Idle => {
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                    }
                    match image.take() {
                        Some(image) if printed > 0 => {
                            let bar = BAR_CHAR.bright_cyan();
                            println!("\n{bar}📎 {}", image.dimmed());
                        }
                        Some(image) => println!("📎 {}", image.dimmed()),
                        None => println!(),
                    }
                    break;
                }
            }
        }
    }

    chat.shutdown();
    ExitCode::SUCCESS
}

fn new_spinner(style: &ProgressStyle) -> ProgressBar {
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(style.clone());
    progress_bar.set_message("🤔 Thinking...");
    progress_bar
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim_end_matches(['\r', '\n']);
    match line.trim() {
        "/quit" => return Input::Quit,
        "/dump" => return Input::Dump,
        "/detach" => return Input::Detach,
        _ => {}
    }
    if let Some(uri) = line.trim().strip_prefix("/image ") {
        let uri = uri.trim();
        if !uri.is_empty() {
            return Input::Image(uri);
        }
    }
    Input::Text(line)
}

async fn dump(chat: &Chat) {
    let Some(snapshot) = chat.snapshot().await else {
        return;
    };
    match snapshot.to_json() {
        Ok(json) => println!("{json}"),
        Err(err) => error!("error serializing the chat: {}", err),
    }
}

async fn read_line<R>(reader: &mut R) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();

    match reader.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
