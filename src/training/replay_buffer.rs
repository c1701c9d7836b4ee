use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::Rng;

use crate::{OfeErr, Result};

/// A uniformly sampled batch of transitions, one per row.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionBatch {
    pub states: Array2<f32>,
    pub actions: Array2<f32>,
    pub next_states: Array2<f32>,
    pub rewards: Array1<f32>,
    /// `1.` for transitions that ended in a terminal state, `0.` otherwise.
    pub dones: Array1<f32>,
}

impl TransitionBatch {
    pub fn len(&self) -> usize {
        self.states.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.states.nrows() == 0
    }
}

/// A fixed capacity ring buffer of transitions, the oldest one is overwritten once it's full.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    states: Array2<f32>,
    actions: Array2<f32>,
    next_states: Array2<f32>,
    rewards: Array1<f32>,
    dones: Array1<f32>,
    cursor: usize,
    len: usize,
}

impl ReplayBuffer {
    /// Creates a new empty `ReplayBuffer`.
    ///
    /// # Arguments
    /// * `capacity` - The maximum amount of transitions kept.
    /// * `dim_state` - The width of a state.
    /// * `dim_action` - The width of an action.
    pub fn new(capacity: usize, dim_state: usize, dim_action: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(OfeErr::InvalidConfig(
                "replay buffer capacity must be non-zero".to_string(),
            ));
        }

        Ok(Self {
            states: Array2::zeros((capacity, dim_state)),
            actions: Array2::zeros((capacity, dim_action)),
            next_states: Array2::zeros((capacity, dim_state)),
            rewards: Array1::zeros(capacity),
            dones: Array1::zeros(capacity),
            cursor: 0,
            len: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.rewards.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores a transition.
    pub fn push(
        &mut self,
        state: ArrayView1<f32>,
        action: ArrayView1<f32>,
        next_state: ArrayView1<f32>,
        reward: f32,
        done: bool,
    ) -> Result<()> {
        for (what, got, expected) in [
            ("state width", state.len(), self.states.ncols()),
            ("action width", action.len(), self.actions.ncols()),
            ("next state width", next_state.len(), self.next_states.ncols()),
        ] {
            if got != expected {
                return Err(OfeErr::SizeMismatch {
                    what,
                    got,
                    expected,
                });
            }
        }

        let i = self.cursor;
        self.states.row_mut(i).assign(&state);
        self.actions.row_mut(i).assign(&action);
        self.next_states.row_mut(i).assign(&next_state);
        self.rewards[i] = reward;
        self.dones[i] = if done { 1. } else { 0. };

        self.cursor = (self.cursor + 1) % self.capacity();
        self.len = (self.len + 1).min(self.capacity());

        Ok(())
    }

    /// Samples `batch_size` stored transitions uniformly, with replacement.
    pub fn sample<R: Rng>(&self, batch_size: usize, rng: &mut R) -> Result<TransitionBatch> {
        if self.is_empty() {
            return Err(OfeErr::EmptyReplayBuffer);
        }

        let indices: Vec<usize> = (0..batch_size)
            .map(|_| rng.random_range(0..self.len))
            .collect();

        Ok(TransitionBatch {
            states: self.states.select(Axis(0), &indices),
            actions: self.actions.select(Axis(0), &indices),
            next_states: self.next_states.select(Axis(0), &indices),
            rewards: self.rewards.select(Axis(0), &indices),
            dones: self.dones.select(Axis(0), &indices),
        })
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn overwrites_the_oldest_transition() {
        let mut buffer = ReplayBuffer::new(2, 1, 1).unwrap();
        for i in 0..3 {
            let v = i as f32;
            buffer
                .push(array![v].view(), array![v].view(), array![v + 1.].view(), v, false)
                .unwrap();
        }

        assert_eq!(buffer.len(), 2);
        let mut rng = StdRng::seed_from_u64(0);
        let batch = buffer.sample(64, &mut rng).unwrap();
        assert!(batch.rewards.iter().all(|&r| r == 1. || r == 2.));
    }

    #[test]
    fn sampled_rows_stay_aligned() {
        let mut buffer = ReplayBuffer::new(10, 2, 1).unwrap();
        for i in 0..10 {
            let v = i as f32;
            buffer
                .push(
                    array![v, -v].view(),
                    array![2. * v].view(),
                    array![v + 1., -v - 1.].view(),
                    v,
                    i % 2 == 0,
                )
                .unwrap();
        }

        let mut rng = StdRng::seed_from_u64(1);
        let batch = buffer.sample(32, &mut rng).unwrap();
        assert_eq!(batch.len(), 32);
        for i in 0..32 {
            let v = batch.rewards[i];
            assert_eq!(batch.states[[i, 1]], -v);
            assert_eq!(batch.actions[[i, 0]], 2. * v);
            assert_eq!(batch.next_states[[i, 0]], v + 1.);
            assert_eq!(batch.dones[i], if v as usize % 2 == 0 { 1. } else { 0. });
        }
    }

    #[test]
    fn empty_buffer_cannot_be_sampled() {
        let buffer = ReplayBuffer::new(4, 1, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            buffer.sample(1, &mut rng),
            Err(OfeErr::EmptyReplayBuffer)
        ));
    }

    #[test]
    fn rejects_wrong_widths() {
        let mut buffer = ReplayBuffer::new(4, 2, 1).unwrap();
        let result = buffer.push(
            array![1.].view(),
            array![1.].view(),
            array![1., 2.].view(),
            0.,
            false,
        );
        assert!(matches!(
            result,
            Err(OfeErr::SizeMismatch { what: "state width", .. })
        ));
    }
}
