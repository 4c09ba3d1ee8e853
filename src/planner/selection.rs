use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::lifecycle::PlannerMsg;
use super::task::TaskGuard;

/// How long a selected entry stays highlighted.
pub const SELECTION_HOLD: Duration = Duration::from_millis(1200);

/// Hover and selection over the flattened activity index. Both the map and the
/// list render from this one value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub hovered: Option<usize>,
    pub selected: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Highlight {
    Neutral,
    Hovered,
    Selected,
}

impl SelectionState {
    pub fn highlight(&self, index: usize) -> Highlight {
        if self.selected == Some(index) {
            Highlight::Selected
        } else if self.hovered == Some(index) {
            Highlight::Hovered
        } else {
            Highlight::Neutral
        }
    }
}

/// Owns the selection state plus the expiry timer that clears it.
#[derive(Debug)]
pub struct SelectionController {
    state: SelectionState,
    timer: Option<TaskGuard>,
    token: u64,
    scroll_request: Option<usize>,
    tx: mpsc::UnboundedSender<PlannerMsg>,
}

impl SelectionController {
    pub fn new(tx: mpsc::UnboundedSender<PlannerMsg>) -> Self {
        Self {
            state: SelectionState::default(),
            timer: None,
            token: 0,
            scroll_request: None,
            tx,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Hover an entry, or clear hover with `None`. Out-of-range indices are
    /// ignored.
    pub fn hover(&mut self, index: Option<usize>, count: usize) {
        match index {
            Some(i) if i >= count => {}
            other => self.state.hovered = other,
        }
    }

    /// Select an entry and (re)start its expiry. Returns `false` when the index
    /// is out of range.
    pub fn select(&mut self, index: usize, count: usize) -> bool {
        if index >= count {
            return false;
        }
        self.token = self.token.wrapping_add(1);
        self.state.selected = Some(index);
        self.scroll_request = Some(index);

        let token = self.token;
        let tx = self.tx.clone();
        let deadline = Instant::now() + SELECTION_HOLD;
        // Replacing the guard aborts the previous timer.
        self.timer = Some(TaskGuard::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = tx.send(PlannerMsg::SelectionExpired { token });
        }));
        tracing::trace!(index, token, "activity selected");
        true
    }

    pub fn expire(&mut self, token: u64) {
        if token != self.token {
            return;
        }
        self.state.selected = None;
        self.timer = None;
    }

    pub fn reset(&mut self) {
        self.token = self.token.wrapping_add(1);
        self.state = SelectionState::default();
        self.timer = None;
        self.scroll_request = None;
    }

    /// The entry the list should scroll into view, once per selection.
    pub fn take_scroll_request(&mut self) -> Option<usize> {
        self.scroll_request.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn pump(controller: &mut SelectionController, rx: &mut mpsc::UnboundedReceiver<PlannerMsg>) {
        while let Ok(msg) = rx.try_recv() {
            if let PlannerMsg::SelectionExpired { token } = msg {
                controller.expire(token);
            }
        }
    }

    #[test]
    fn selected_dominates_hovered() {
        let state = SelectionState {
            hovered: Some(2),
            selected: Some(2),
        };
        assert_eq!(state.highlight(2), Highlight::Selected);
        let state = SelectionState {
            hovered: Some(2),
            selected: Some(1),
        };
        assert_eq!(state.highlight(2), Highlight::Hovered);
        assert_eq!(state.highlight(1), Highlight::Selected);
        assert_eq!(state.highlight(0), Highlight::Neutral);
    }

    #[tokio::test]
    async fn hover_ignores_out_of_range() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut controller = SelectionController::new(tx);
        controller.hover(Some(1), 3);
        assert_eq!(controller.state().hovered, Some(1));
        controller.hover(Some(3), 3);
        assert_eq!(controller.state().hovered, Some(1));
        controller.hover(None, 3);
        assert_eq!(controller.state().hovered, None);
    }

    #[tokio::test(start_paused = true)]
    async fn selection_expires_after_hold() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut controller = SelectionController::new(tx);

        assert!(controller.select(1, 3));
        assert_eq!(controller.state().selected, Some(1));
        assert_eq!(controller.take_scroll_request(), Some(1));
        assert_eq!(controller.take_scroll_request(), None);

        tokio::time::advance(Duration::from_millis(1199)).await;
        settle().await;
        pump(&mut controller, &mut rx);
        assert_eq!(controller.state().selected, Some(1));

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        pump(&mut controller, &mut rx);
        assert_eq!(controller.state().selected, None);
    }

    #[tokio::test(start_paused = true)]
    async fn reselecting_restarts_the_hold() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut controller = SelectionController::new(tx);

        controller.select(0, 3);
        tokio::time::advance(Duration::from_millis(800)).await;
        settle().await;
        controller.select(0, 3);

        tokio::time::advance(Duration::from_millis(800)).await;
        settle().await;
        pump(&mut controller, &mut rx);
        assert_eq!(controller.state().selected, Some(0));

        tokio::time::advance(Duration::from_millis(400)).await;
        settle().await;
        pump(&mut controller, &mut rx);
        assert_eq!(controller.state().selected, None);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_expiry_does_not_clear_a_newer_selection() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut controller = SelectionController::new(tx);

        controller.select(0, 3);
        controller.select(2, 3);
        controller.expire(1);
        assert_eq!(controller.state().selected, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_the_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut controller = SelectionController::new(tx);

        controller.select(0, 3);
        controller.hover(Some(1), 3);
        controller.reset();
        assert_eq!(controller.state(), SelectionState::default());

        tokio::time::advance(Duration::from_millis(2000)).await;
        settle().await;
        assert!(rx.try_recv().is_err());
    }
}
