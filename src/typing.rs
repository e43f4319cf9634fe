//! Typewriter effect: grows a phrase one grapheme at a time, holds it, erases
//! it faster than it was typed, then moves on to the next phrase.

use crate::config::TypingTimings;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Growing,
    Pausing,
    Shrinking,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingState {
    pub phrase_index: usize,
    /// Phrase at `phrase_index`; empty when there are no phrases.
    pub source_phrase: String,
    pub displayed_len: usize,
    pub phase: Phase,
}

/// One displayed string and how long it stays on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingFrame {
    pub text: String,
    pub hold: Duration,
}

/// Lazy, infinite sequence of typing frames over a cycle of phrases.
///
/// An empty phrase list yields nothing. Build a new one to restart.
#[derive(Debug, Clone)]
pub struct Typewriter {
    phrases: Vec<String>,
    timings: TypingTimings,
    state: TypingState,
}

impl Typewriter {
    pub fn new(phrases: Vec<String>, timings: TypingTimings) -> Self {
        let source_phrase = phrases.first().cloned().unwrap_or_default();
        Self {
            phrases,
            timings,
            state: TypingState {
                phrase_index: 0,
                source_phrase,
                displayed_len: 0,
                phase: Phase::Growing,
            },
        }
    }

    pub fn state(&self) -> &TypingState {
        &self.state
    }

    pub fn source_phrase(&self) -> Option<&str> {
        if self.phrases.is_empty() {
            return None;
        }
        Some(&self.state.source_phrase)
    }

    fn phrase_len(&self) -> usize {
        self.source_phrase()
            .map(|phrase| phrase.graphemes(true).count())
            .unwrap_or(0)
    }

    fn prefix(&self) -> String {
        self.source_phrase()
            .map(|phrase| phrase.graphemes(true).take(self.state.displayed_len).collect())
            .unwrap_or_default()
    }

    fn step(&mut self) -> TypingFrame {
        match self.state.phase {
            Phase::Growing => {
                let text = self.prefix();
                if self.state.displayed_len >= self.phrase_len() {
                    self.state.phase = Phase::Pausing;
                } else {
                    self.state.displayed_len += 1;
                }
                TypingFrame {
                    text,
                    hold: self.timings.grow_tick(),
                }
            }
            Phase::Pausing => {
                self.state.phase = Phase::Shrinking;
                TypingFrame {
                    text: self.prefix(),
                    hold: self.timings.pause(),
                }
            }
            Phase::Shrinking => {
                if self.state.displayed_len == 0 {
                    self.state.phrase_index = (self.state.phrase_index + 1) % self.phrases.len();
                    self.state.source_phrase = self.phrases[self.state.phrase_index].clone();
                    self.state.phase = Phase::Growing;
                    return self.step();
                }
                self.state.displayed_len -= 1;
                TypingFrame {
                    text: self.prefix(),
                    hold: self.timings.shrink_tick(),
                }
            }
        }
    }
}

impl Iterator for Typewriter {
    type Item = TypingFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.phrases.is_empty() {
            return None;
        }
        Some(self.step())
    }
}

/// Drives a [`Typewriter`] on the runtime and publishes the current text.
///
/// Stopping (explicitly or by dropping) halts the animation before its next
/// tick; the last published text stays readable.
pub struct TypingAnimation {
    token: CancellationToken,
    text_rx: watch::Receiver<String>,
}

impl TypingAnimation {
    pub fn spawn(runtime_handle: &Handle, mut typewriter: Typewriter) -> Self {
        let token = CancellationToken::new();
        let (text_tx, text_rx) = watch::channel(String::new());

        let task_token = token.clone();
        runtime_handle.spawn(async move {
            while !task_token.is_cancelled() {
                let Some(frame) = typewriter.next() else {
                    break;
                };
                if text_tx.send(frame.text).is_err() {
                    break;
                }
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = tokio::time::sleep(frame.hold) => {}
                }
            }
        });

        Self { token, text_rx }
    }

    pub fn current(&self) -> String {
        self.text_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.text_rx.clone()
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for TypingAnimation {
    fn drop(&mut self) {
        self.stop();
    }
}
