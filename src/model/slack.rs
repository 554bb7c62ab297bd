//! Board/alight/transfer slacks : the mandatory buffer times added when
//! computing feasible connections.

use crate::time::PositiveDuration;

/// Slack values, possibly varying per pattern through the pattern's
/// slack index.
///
/// Index 0 always exists and is the default ; a pattern with a slack
/// index beyond the configured tables falls back to it.
#[derive(Debug, Clone)]
pub struct SlackProvider {
    board: Vec<PositiveDuration>,
    alight: Vec<PositiveDuration>,
    transfer: PositiveDuration,
}

impl SlackProvider {
    pub fn new(
        board: Vec<PositiveDuration>,
        alight: Vec<PositiveDuration>,
        transfer: PositiveDuration,
    ) -> Self {
        assert!(!board.is_empty() && !alight.is_empty());
        Self {
            board,
            alight,
            transfer,
        }
    }

    pub fn uniform(
        board: PositiveDuration,
        alight: PositiveDuration,
        transfer: PositiveDuration,
    ) -> Self {
        Self::new(vec![board], vec![alight], transfer)
    }

    pub fn board_slack(&self, slack_index: usize) -> PositiveDuration {
        *self.board.get(slack_index).unwrap_or(&self.board[0])
    }

    pub fn alight_slack(&self, slack_index: usize) -> PositiveDuration {
        *self.alight.get(slack_index).unwrap_or(&self.alight[0])
    }

    pub fn transfer_slack(&self) -> PositiveDuration {
        self.transfer
    }
}

impl Default for SlackProvider {
    fn default() -> Self {
        Self::uniform(
            PositiveDuration::zero(),
            PositiveDuration::zero(),
            PositiveDuration::zero(),
        )
    }
}
