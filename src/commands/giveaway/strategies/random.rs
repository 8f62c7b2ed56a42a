use std::sync::Mutex;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::commands::giveaway::models::EntrantId;
use crate::commands::giveaway::strategies::base::{DrawOptions, WinnerStrategy};

// Uniform sampling of winners without replacement.
#[derive(Debug)]
pub struct RandomSampleStrategy {
    rng: Mutex<StdRng>,
}

impl RandomSampleStrategy {
    pub fn new() -> Self {
        RandomSampleStrategy {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        RandomSampleStrategy {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl WinnerStrategy for RandomSampleStrategy {
    fn draw(&self, options: &DrawOptions) -> Vec<EntrantId> {
        // Sorting first keeps a seeded draw reproducible regardless of the
        // hash set iteration order.
        let mut participants = options.participants().iter().copied().collect::<Vec<EntrantId>>();
        participants.sort_unstable();

        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        participants
            .choose_multiple(&mut *rng, options.winner_count())
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::commands::giveaway::strategies::{
        DrawOptions, RandomSampleStrategy, WinnerStrategy,
    };

    #[test]
    fn test_draw_requested_amount_of_distinct_winners() {
        let participants = (1..=10).collect::<HashSet<u64>>();
        let options = DrawOptions::new(&participants, 3);

        let strategy = RandomSampleStrategy::new();
        let winners = strategy.draw(&options);

        assert_eq!(winners.len(), 3);
        assert_eq!(winners.iter().collect::<HashSet<_>>().len(), 3);
        assert_eq!(winners.iter().all(|winner| participants.contains(winner)), true);
    }

    #[test]
    fn test_draw_is_capped_by_participants() {
        let participants = HashSet::from([1, 2]);
        let options = DrawOptions::new(&participants, 5);

        let strategy = RandomSampleStrategy::new();
        let mut winners = strategy.draw(&options);
        winners.sort();

        assert_eq!(winners, vec![1, 2]);
    }

    #[test]
    fn test_draw_from_empty_participants() {
        let participants = HashSet::new();
        let options = DrawOptions::new(&participants, 1);

        let strategy = RandomSampleStrategy::new();
        assert_eq!(strategy.draw(&options).is_empty(), true);
    }

    #[test]
    fn test_seeded_draws_are_reproducible() {
        let participants = (1..=50).collect::<HashSet<u64>>();
        let options = DrawOptions::new(&participants, 5);

        let first = RandomSampleStrategy::seeded(42).draw(&options);
        let second = RandomSampleStrategy::seeded(42).draw(&options);
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_participant_can_win() {
        let participants = HashSet::from([1, 2, 3]);
        let options = DrawOptions::new(&participants, 1);
        let strategy = RandomSampleStrategy::seeded(7);

        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.extend(strategy.draw(&options));
        }
        assert_eq!(seen, participants);
    }
}
