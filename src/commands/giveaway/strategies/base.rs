use std::collections::HashSet;

use crate::commands::giveaway::models::EntrantId;

pub struct DrawOptions<'a> {
    participants: &'a HashSet<EntrantId>,
    winner_count: usize,
}

impl<'a> DrawOptions<'a> {
    pub fn new(participants: &'a HashSet<EntrantId>, winner_count: usize) -> Self {
        DrawOptions {
            participants,
            winner_count,
        }
    }

    // Returns the frozen set of entrants to draw from.
    pub fn participants(&self) -> &'a HashSet<EntrantId> {
        self.participants
    }

    // Returns how many winners must be selected, capped by the number
    // of participants.
    pub fn winner_count(&self) -> usize {
        self.winner_count.min(self.participants.len())
    }
}

pub trait WinnerStrategy: Send + Sync {
    // Returns distinct winners picked from the participants. The amount of
    // winners must be equal to `options.winner_count()`.
    fn draw(&self, options: &DrawOptions) -> Vec<EntrantId>;
}
