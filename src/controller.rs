use std::time::Duration;
use tracing::trace;

use crate::domain::{DexConfig, DexError, Message};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &DexConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, _model: &Model) -> Result<Option<Message>, DexError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    return Ok(self.handle_key(key));
                }
                Event::Resize(width, height) => {
                    return Ok(Some(Message::Resize(width as usize, height as usize)));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Tab => Some(Message::CycleMode),
            KeyCode::Char('t') => Some(Message::CycleKind),
            KeyCode::Char('h') | KeyCode::Left => Some(Message::PrevColumn),
            KeyCode::Char('l') | KeyCode::Right => Some(Message::NextColumn),
            KeyCode::Char('j') | KeyCode::Down => Some(Message::ScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Message::ScrollUp),
            KeyCode::PageDown => Some(Message::ScrollPageDown),
            KeyCode::PageUp => Some(Message::ScrollPageUp),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Message::MoreBins),
            KeyCode::Char('-') | KeyCode::Char('_') => Some(Message::FewerBins),
            KeyCode::Char(']') => Some(Message::MoreOpacity),
            KeyCode::Char('[') => Some(Message::LessOpacity),
            KeyCode::Char('c') => Some(Message::CycleColor),
            KeyCode::Char('d') => Some(Message::TogglePreview),
            KeyCode::Char('y') => Some(Message::CopyView),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Esc => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn map(code: KeyCode) -> Option<Message> {
        let controller = Controller::new(&DexConfig::default());
        controller.handle_key(KeyEvent::from(code))
    }

    #[test]
    fn widget_keys_map_to_messages() {
        assert_eq!(map(KeyCode::Char('q')), Some(Message::Quit));
        assert_eq!(map(KeyCode::Tab), Some(Message::CycleMode));
        assert_eq!(map(KeyCode::Char('t')), Some(Message::CycleKind));
        assert_eq!(map(KeyCode::Right), Some(Message::NextColumn));
        assert_eq!(map(KeyCode::Char('+')), Some(Message::MoreBins));
        assert_eq!(map(KeyCode::Char('[')), Some(Message::LessOpacity));
        assert_eq!(map(KeyCode::Char('c')), Some(Message::CycleColor));
        assert_eq!(map(KeyCode::Char('?')), Some(Message::Help));
        assert_eq!(map(KeyCode::Char('x')), None);
    }
}
