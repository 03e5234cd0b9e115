//! Cursor, viewport and filter state for the interactive browser.
//!
//! Everything here is a pure function of its inputs: the terminal session
//! in [`super::app`] feeds key events in and executes the returned
//! [`Effect`]s.

use crate::domain::Conference;
use crate::filter::ConferenceFilter;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    /// Index into the filtered, sorted view.
    pub cursor: usize,
    /// Index of the first visible row.
    pub offset: usize,
    pub topic_filter: Option<String>,
    pub country_filter: Option<String>,
}

/// Discrete inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    Home,
    End,
    Open,
    ToggleStar,
    SetTopic(Option<String>),
    SetCountry(Option<String>),
    ClearFilters,
    Refresh,
    Quit,
}

/// Side effects a transition asks the session to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    OpenUrl(String),
    ToggleStar(String),
    /// Refresh sources and reload the dataset; the cursor is already reset.
    Refresh,
    /// Persist stars and leave the loop.
    Quit,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The filter the current view is computed with.
    pub fn filter(&self) -> ConferenceFilter {
        ConferenceFilter {
            topic: self.topic_filter.clone(),
            country: self.country_filter.clone(),
            ..ConferenceFilter::default()
        }
    }

    /// Recompute the viewport so the cursor row is visible.
    pub fn with_viewport(mut self, page_size: usize, total: usize) -> Self {
        self.offset = viewport_offset(self.cursor, self.offset, page_size, total);
        self
    }
}

/// Rows available for the list given the terminal height.
pub fn page_size(terminal_height: u16, min_page_size: usize, reserved_rows: usize) -> usize {
    (terminal_height as usize)
        .saturating_sub(reserved_rows)
        .max(min_page_size)
        .max(1)
}

/// Scroll just enough to show `cursor`, never past the end of the list.
pub fn viewport_offset(cursor: usize, offset: usize, page_size: usize, total: usize) -> usize {
    let page_size = page_size.max(1);
    let mut offset = offset;
    if cursor < offset {
        offset = cursor;
    }
    if cursor >= offset + page_size {
        offset = cursor + 1 - page_size;
    }
    offset.min(total.saturating_sub(page_size))
}

fn clamp_cursor(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}

/// Apply one event to the state against the current filtered `view`.
///
/// Movement is clamped to the view. Open and toggle-star on an empty view
/// do nothing.
pub fn transition(
    mut state: NavigationState,
    event: NavEvent,
    view: &[Conference],
    page_size: usize,
) -> (NavigationState, Option<Effect>) {
    let len = view.len();
    let page = page_size.max(1);

    let effect = match event {
        NavEvent::MoveUp => {
            state.cursor = state.cursor.saturating_sub(1);
            None
        }
        NavEvent::MoveDown => {
            state.cursor = clamp_cursor(state.cursor + 1, len);
            None
        }
        NavEvent::PageUp => {
            state.cursor = state.cursor.saturating_sub(page);
            None
        }
        NavEvent::PageDown => {
            state.cursor = clamp_cursor(state.cursor + page, len);
            None
        }
        NavEvent::Home => {
            state.cursor = 0;
            None
        }
        NavEvent::End => {
            state.cursor = len.saturating_sub(1);
            None
        }
        NavEvent::Open => view
            .get(state.cursor)
            .map(|c| Effect::OpenUrl(c.url.clone())),
        NavEvent::ToggleStar => view
            .get(state.cursor)
            .map(|c| Effect::ToggleStar(c.name.clone())),
        NavEvent::SetTopic(topic) => {
            state.topic_filter = topic;
            state.cursor = 0;
            None
        }
        NavEvent::SetCountry(country) => {
            state.country_filter = country;
            state.cursor = 0;
            None
        }
        NavEvent::ClearFilters => {
            state.topic_filter = None;
            state.country_filter = None;
            state.cursor = 0;
            None
        }
        NavEvent::Refresh => {
            state.cursor = 0;
            Some(Effect::Refresh)
        }
        NavEvent::Quit => Some(Effect::Quit),
    };

    (state, effect)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(len: usize) -> Vec<Conference> {
        (0..len)
            .map(|i| Conference {
                name: format!("Conf {i}"),
                start_date: "2025-01-01".to_string(),
                end_date: "2025-01-01".to_string(),
                city: String::new(),
                country: String::new(),
                url: format!("https://conf{i}.example"),
                topics: vec![],
            })
            .collect()
    }

    fn run(events: &[NavEvent], items: &[Conference], page: usize) -> NavigationState {
        events.iter().cloned().fold(NavigationState::new(), |state, event| {
            transition(state, event, items, page).0.with_viewport(page, items.len())
        })
    }

    #[test]
    fn test_move_is_clamped() {
        let items = view(3);
        let state = run(&[NavEvent::MoveUp], &items, 5);
        assert_eq!(state.cursor, 0);

        let state = run(&vec![NavEvent::MoveDown; 10], &items, 5);
        assert_eq!(state.cursor, 2);
    }

    #[test]
    fn test_page_moves_by_page_size() {
        let items = view(30);
        let state = run(&[NavEvent::PageDown, NavEvent::PageDown], &items, 10);
        assert_eq!(state.cursor, 20);
        assert_eq!(state.offset, 11);

        let state = run(&vec![NavEvent::PageDown; 5], &items, 10);
        assert_eq!(state.cursor, 29);
        assert_eq!(state.offset, 20);

        let state = run(&[NavEvent::End, NavEvent::PageUp], &items, 10);
        assert_eq!(state.cursor, 19);
        assert_eq!(state.offset, 19);
    }

    #[test]
    fn test_home_and_end() {
        let items = view(8);
        let state = run(&[NavEvent::End], &items, 5);
        assert_eq!((state.cursor, state.offset), (7, 3));
        let state = run(&[NavEvent::End, NavEvent::Home], &items, 5);
        assert_eq!((state.cursor, state.offset), (0, 0));
    }

    #[test]
    fn test_empty_view_keeps_cursor_at_zero() {
        let state = run(&[NavEvent::MoveDown, NavEvent::End, NavEvent::PageDown], &[], 5);
        assert_eq!((state.cursor, state.offset), (0, 0));

        let (_, effect) = transition(NavigationState::new(), NavEvent::Open, &[], 5);
        assert!(effect.is_none());
    }

    #[test]
    fn test_open_and_star_target_current_item() {
        let items = view(3);
        let state = run(&[NavEvent::MoveDown], &items, 5);

        let (after, effect) = transition(state.clone(), NavEvent::Open, &items, 5);
        assert_eq!(after, state);
        assert_eq!(effect, Some(Effect::OpenUrl("https://conf1.example".to_string())));

        let (_, effect) = transition(state, NavEvent::ToggleStar, &items, 5);
        assert_eq!(effect, Some(Effect::ToggleStar("Conf 1".to_string())));
    }

    #[test]
    fn test_filters_reset_cursor() {
        let items = view(10);
        let state = run(
            &[NavEvent::End, NavEvent::SetTopic(Some("rust".to_string()))],
            &items,
            5,
        );
        assert_eq!(state.cursor, 0);
        assert_eq!(state.topic_filter.as_deref(), Some("rust"));

        let (state, _) = transition(state, NavEvent::SetCountry(Some("Online".to_string())), &items, 5);
        let (state, _) = transition(state, NavEvent::ClearFilters, &items, 5);
        assert_eq!(state, NavigationState::new());
    }

    #[test]
    fn test_refresh_keeps_filters() {
        let mut state = NavigationState::new();
        state.cursor = 4;
        state.topic_filter = Some("ai".to_string());
        let (state, effect) = transition(state, NavEvent::Refresh, &view(5), 5);
        assert_eq!(state.cursor, 0);
        assert_eq!(state.topic_filter.as_deref(), Some("ai"));
        assert_eq!(effect, Some(Effect::Refresh));
    }

    #[test]
    fn test_viewport_offset_rules() {
        assert_eq!(viewport_offset(2, 5, 4, 20), 2);
        assert_eq!(viewport_offset(9, 0, 4, 20), 6);
        assert_eq!(viewport_offset(3, 0, 4, 20), 0);
        assert_eq!(viewport_offset(0, 10, 4, 3), 0);
        assert_eq!(viewport_offset(19, 18, 4, 20), 16);
    }

    #[test]
    fn test_viewport_invariant_over_event_sequences() {
        let events = [
            NavEvent::PageDown,
            NavEvent::MoveDown,
            NavEvent::End,
            NavEvent::PageUp,
            NavEvent::MoveUp,
            NavEvent::Home,
            NavEvent::PageDown,
            NavEvent::PageDown,
            NavEvent::MoveUp,
        ];
        for total in [1usize, 3, 7, 25] {
            for page in [1usize, 2, 5, 10] {
                let items = view(total);
                let mut state = NavigationState::new();
                for event in events.iter().cloned() {
                    state = transition(state, event, &items, page).0.with_viewport(page, total);
                    assert!(state.offset <= state.cursor);
                    assert!(state.cursor < state.offset + page);
                    assert!(state.cursor < total);
                    assert!(state.offset <= total.saturating_sub(page));
                }
            }
        }
    }

    #[test]
    fn test_page_size_from_height() {
        assert_eq!(page_size(40, 5, 10), 30);
        assert_eq!(page_size(12, 5, 10), 5);
        assert_eq!(page_size(0, 0, 10), 1);
    }
}
