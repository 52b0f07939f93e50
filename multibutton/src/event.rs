//! Events delivered to the [`EventSink`](crate::EventSink).

use std::fmt::{Display, Formatter};

/// What happened to a button.
///
/// The discriminants are distinct bits, so statuses can be collected into a [`StatusSet`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u16)]
pub enum ButtonStatus {
    Press = 1 << 0,
    Release = 1 << 1,
    SingleClick = 1 << 2,
    DoubleClick = 1 << 3,
    TripleClick = 1 << 4,
    /// Four or more clicks; the count is in [`ButtonEvent::times`].
    RepeatClick = 1 << 5,
    ShortPressStart = 1 << 6,
    ShortPressEnd = 1 << 7,
    LongPressStart = 1 << 8,
    /// Sent on every decoder sweep while a long press is held.
    LongPressHold = 1 << 9,
    LongPressEnd = 1 << 10,
}

impl ButtonStatus {
    pub const ALL: [ButtonStatus; 11] = [
        ButtonStatus::Press,
        ButtonStatus::Release,
        ButtonStatus::SingleClick,
        ButtonStatus::DoubleClick,
        ButtonStatus::TripleClick,
        ButtonStatus::RepeatClick,
        ButtonStatus::ShortPressStart,
        ButtonStatus::ShortPressEnd,
        ButtonStatus::LongPressStart,
        ButtonStatus::LongPressHold,
        ButtonStatus::LongPressEnd,
    ];

    pub const fn bits(self) -> u16 {
        self as u16
    }

    /// Whether the status is a decoded gesture rather than a raw edge.
    pub fn is_gesture(self) -> bool {
        !matches!(self, ButtonStatus::Press | ButtonStatus::Release)
    }
}

impl Display for ButtonStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ButtonStatus::Press => "press",
            ButtonStatus::Release => "release",
            ButtonStatus::SingleClick => "single click",
            ButtonStatus::DoubleClick => "double click",
            ButtonStatus::TripleClick => "triple click",
            ButtonStatus::RepeatClick => "repeat click",
            ButtonStatus::ShortPressStart => "short press start",
            ButtonStatus::ShortPressEnd => "short press end",
            ButtonStatus::LongPressStart => "long press start",
            ButtonStatus::LongPressHold => "long press hold",
            ButtonStatus::LongPressEnd => "long press end",
        };
        f.write_str(name)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ButtonEvent {
    pub status: ButtonStatus,
    /// Click count for click statuses, 0 otherwise.
    pub times: u16,
}

impl ButtonEvent {
    pub const fn new(status: ButtonStatus, times: u16) -> Self {
        Self { status, times }
    }
}

impl Display for ButtonEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            ButtonStatus::RepeatClick => write!(f, "{} with {} times", self.status, self.times),
            status => write!(f, "{}", status),
        }
    }
}

/// A set of [`ButtonStatus`] values, stored as their combined bits.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct StatusSet(u16);

impl StatusSet {
    const COMPLETE: u16 = (1 << ButtonStatus::ALL.len()) - 1;

    pub const fn new() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, status: ButtonStatus) {
        self.0 |= status.bits();
    }

    pub fn contains(&self, status: ButtonStatus) -> bool {
        self.0 & status.bits() != 0
    }

    /// Whether every status has been seen.
    pub fn is_complete(&self) -> bool {
        self.0 & Self::COMPLETE == Self::COMPLETE
    }

    pub fn missing(&self) -> impl Iterator<Item = ButtonStatus> + '_ {
        ButtonStatus::ALL.into_iter().filter(|&status| !self.contains(status))
    }
}

impl FromIterator<ButtonStatus> for StatusSet {
    fn from_iter<T: IntoIterator<Item = ButtonStatus>>(iter: T) -> Self {
        let mut set = StatusSet::new();
        for status in iter {
            set.insert(status);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_bits_are_distinct() {
        let combined = ButtonStatus::ALL.iter().fold(0u16, |acc, s| {
            assert_eq!(acc & s.bits(), 0);
            acc | s.bits()
        });
        assert_eq!(combined, 0x07FF);
    }

    #[test]
    fn status_set_tracks_completion() {
        let mut set: StatusSet = ButtonStatus::ALL[..10].iter().copied().collect();
        assert!(!set.is_complete());
        assert_eq!(set.missing().collect::<Vec<_>>(), vec![ButtonStatus::LongPressEnd]);

        set.insert(ButtonStatus::LongPressEnd);
        assert!(set.is_complete());
        assert_eq!(set.missing().count(), 0);
    }

    #[test]
    fn repeat_click_shows_its_count() {
        let event = ButtonEvent::new(ButtonStatus::RepeatClick, 5);
        assert_eq!(event.to_string(), "repeat click with 5 times");
        assert_eq!(ButtonEvent::new(ButtonStatus::SingleClick, 1).to_string(), "single click");
    }
}
