//! Modal message windows, shown one at a time in arrival order.

use std::collections::VecDeque;

use egui_sdl2::egui;

use crate::i18n::I18n;

/// What accepting a confirm window does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Confirm {
    /// Destroy these items of the active player character.
    ThrowItems(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Translation id or literal text.
    pub text: String,
    /// Set for accept/cancel windows; plain info windows only close.
    pub confirm: Option<Confirm>,
}

impl Message {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confirm: None,
        }
    }

    pub fn confirm(text: impl Into<String>, confirm: Confirm) -> Self {
        Self {
            text: text.into(),
            confirm: Some(confirm),
        }
    }
}

#[derive(Debug, Default)]
pub struct MessageQueue {
    queue: VecDeque<Message>,
    answers: Vec<(Message, bool)>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        log::debug!("Message queued: {}", message.text);
        self.queue.push_back(message);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn front(&self) -> Option<&Message> {
        self.queue.front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Closes the visible window; the next one, if any, shows up.
    pub fn close_front(&mut self, accepted: bool) {
        if let Some(message) = self.queue.pop_front() {
            self.answers.push((message, accepted));
        }
    }

    /// Windows closed since the last call, with whether they were accepted.
    pub fn take_answers(&mut self) -> Vec<(Message, bool)> {
        std::mem::take(&mut self.answers)
    }

    pub fn show(&mut self, ctx: &egui::Context, i18n: &I18n) {
        let Some(message) = self.queue.front() else {
            return;
        };
        let mut answer = None;
        egui::Window::new(i18n.text("message"))
            .id(egui::Id::new("hud_message"))
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(i18n.text(&message.text));
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if message.confirm.is_some() {
                        if ui
                            .add(egui::Button::new(i18n.text("accept")).min_size([100.0, 28.0].into()))
                            .clicked()
                        {
                            answer = Some(true);
                        }
                        if ui
                            .add(egui::Button::new(i18n.text("cancel")).min_size([100.0, 28.0].into()))
                            .clicked()
                        {
                            answer = Some(false);
                        }
                    } else if ui
                        .add(egui::Button::new(i18n.text("ok")).min_size([100.0, 28.0].into()))
                        .clicked()
                    {
                        answer = Some(true);
                    }
                });
            });
        if let Some(accepted) = answer {
            self.close_front(accepted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_close_in_arrival_order() {
        let mut queue = MessageQueue::new();
        queue.push(Message::info("save_done"));
        queue.push(Message::confirm(
            "remove_items_q",
            Confirm::ThrowItems(vec!["apple2".into()]),
        ));
        assert_eq!(queue.front().unwrap().text, "save_done");

        queue.close_front(true);
        assert_eq!(queue.front().unwrap().text, "remove_items_q");
        queue.close_front(false);
        assert!(queue.is_empty());

        let answers = queue.take_answers();
        assert_eq!(answers.len(), 2);
        assert!(answers[0].1);
        assert_eq!(
            answers[1],
            (
                Message::confirm("remove_items_q", Confirm::ThrowItems(vec!["apple2".into()])),
                false
            )
        );
        assert!(queue.take_answers().is_empty());
    }
}
