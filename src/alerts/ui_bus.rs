// src/alerts/ui_bus.rs
//
// Commands the alert engine emits for the UI and speech layers. The engine
// publishes; the render loop drains. Neither reaches into the other's state.

use std::collections::VecDeque;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    /// Show `image` in the alert bar under `label`.
    ShowSign {
        label: String,
        image: &'static str,
    },

    /// Tear down the alert bar entry for `label`.
    RemoveSign { label: String },

    /// Play `text` on the speech engine. Only emitted for granted utterances.
    Speak { text: String },
}

pub struct UiCommandBus {
    commands: VecDeque<UiCommand>,
    max_pending: usize,
}

impl UiCommandBus {
    pub fn new(max_pending: usize) -> Self {
        Self {
            commands: VecDeque::with_capacity(max_pending),
            max_pending,
        }
    }

    pub fn publish(&mut self, command: UiCommand) {
        if self.commands.len() >= self.max_pending {
            warn!(
                "UI command bus full ({} commands), dropping oldest",
                self.max_pending
            );
            self.commands.pop_front();
        }
        self.commands.push_back(command);
    }

    pub fn drain(&mut self) -> Vec<UiCommand> {
        self.commands.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.commands.len()
    }
}
