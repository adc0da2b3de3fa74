// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session control for Mneme.
//!
//! The [`Dispatcher`] owns the conversation buffer for one interactive
//! session and routes each input line: prompts and `/recall` turns go
//! through the [`ResponseStreamer`], `/forget` edits the history ledger.

pub mod dispatcher;
pub mod prompt;
pub mod responder;
pub mod shutdown;

#[cfg(test)]
mod test_support;

pub use dispatcher::{Command, Dispatch, Dispatcher};
pub use prompt::{load_system_prompt, render_transcript, SYSTEM_PROMPT};
pub use responder::{ResponseOutcome, ResponseSink, ResponseStreamer, TurnKind};
pub use shutdown::cancel_on_ctrl_c;
