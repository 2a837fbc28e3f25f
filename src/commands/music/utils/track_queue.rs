use super::music_manager::{MusicError, MusicResult};
use crate::commands::music::audio_sources::Track;
use std::collections::VecDeque;
use std::time::Duration;

/// Default budget for the summed length of queued tracks
pub const DEFAULT_MAX_QUEUE_DURATION: Duration = Duration::from_secs(2 * 60 * 60);

/// FIFO of tracks waiting to be played in one guild.
///
/// The summed length of the queued tracks never exceeds `max_duration`.
/// Insertions that would break that are rejected before anything is appended,
/// so a rejected playlist leaves the queue exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackQueue {
    tracks: VecDeque<Track>,
    // Sum of `tracks` lengths, kept in step with every mutation
    total: Duration,
    max_duration: Duration,
}

impl Default for TrackQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUEUE_DURATION)
    }
}

impl TrackQueue {
    pub fn new(max_duration: Duration) -> Self {
        Self {
            tracks: VecDeque::new(),
            total: Duration::ZERO,
            max_duration,
        }
    }

    /// Append one track; returns its 1-based position in the queue
    pub fn enqueue_one(&mut self, track: Track) -> MusicResult<usize> {
        self.total = self.prospective_total(track.length)?;
        self.tracks.push_back(track);
        Ok(self.tracks.len())
    }

    /// Append a batch in order; returns how many tracks were added
    pub fn enqueue_many(&mut self, tracks: Vec<Track>) -> MusicResult<usize> {
        let added = tracks
            .iter()
            .try_fold(Duration::ZERO, |sum, track| sum.checked_add(track.length))
            .ok_or_else(|| self.budget_exceeded())?;

        self.total = self.prospective_total(added)?;
        let count = tracks.len();
        self.tracks.extend(tracks);
        Ok(count)
    }

    /// Pop the head of the queue; `None` means there is nothing left to play
    pub fn dequeue_next(&mut self) -> Option<Track> {
        let track = self.tracks.pop_front()?;
        self.total = self.total.saturating_sub(track.length);
        Some(track)
    }

    /// Owned snapshot of the queue, in play order
    pub fn peek_all(&self) -> Vec<Track> {
        self.tracks.iter().cloned().collect()
    }

    pub fn total_duration(&self) -> Duration {
        self.total
    }

    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.total = Duration::ZERO;
    }

    fn prospective_total(&self, added: Duration) -> MusicResult<Duration> {
        match self.total.checked_add(added) {
            Some(total) if total <= self.max_duration => Ok(total),
            _ => Err(self.budget_exceeded()),
        }
    }

    fn budget_exceeded(&self) -> MusicError {
        MusicError::QueueBudgetExceeded {
            limit: self.max_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn track(title: &str, millis: u64) -> Track {
        Track {
            title: title.to_string(),
            author: "Test Artist".to_string(),
            length: Duration::from_millis(millis),
            uri: Some(format!("https://soundcloud.com/test/{}", title)),
            album: None,
            artwork_url: None,
            source_name: "soundcloud".to_string(),
            encoded: format!("encoded-{}", title),
        }
    }

    fn titles(queue: &TrackQueue) -> Vec<String> {
        queue.peek_all().into_iter().map(|t| t.title).collect()
    }

    #[test]
    fn enqueue_returns_positions_and_keeps_order() {
        let mut queue = TrackQueue::default();

        assert_eq!(queue.enqueue_one(track("a", 1_000)).unwrap(), 1);
        assert_eq!(queue.enqueue_one(track("b", 2_000)).unwrap(), 2);
        assert_eq!(
            queue
                .enqueue_many(vec![track("c", 3_000), track("d", 4_000)])
                .unwrap(),
            2
        );

        assert_eq!(titles(&queue), vec!["a", "b", "c", "d"]);
        assert_eq!(queue.total_duration(), Duration::from_millis(10_000));
    }

    #[test]
    fn rejects_track_over_budget_and_keeps_queue() {
        let mut queue = TrackQueue::new(Duration::from_millis(7_200_000));

        queue.enqueue_one(track("a", 5_000_000)).unwrap();
        let before = queue.clone();

        assert_matches!(
            queue.enqueue_one(track("b", 3_000_000)),
            Err(MusicError::QueueBudgetExceeded { limit }) if limit == Duration::from_millis(7_200_000)
        );
        assert_eq!(queue, before);
        assert_eq!(titles(&queue), vec!["a"]);
    }

    #[test]
    fn playlist_is_rejected_atomically() {
        let mut queue = TrackQueue::new(Duration::from_secs(600));
        queue.enqueue_one(track("a", 200_000)).unwrap();
        let before = queue.clone();

        // First two would fit on their own, the third breaks the budget
        let playlist = vec![track("b", 100_000), track("c", 100_000), track("d", 300_000)];
        assert_matches!(
            queue.enqueue_many(playlist),
            Err(MusicError::QueueBudgetExceeded { .. })
        );
        assert_eq!(queue, before);
    }

    #[test]
    fn exactly_filling_the_budget_is_allowed() {
        let mut queue = TrackQueue::new(Duration::from_secs(60));
        queue.enqueue_one(track("a", 30_000)).unwrap();
        queue.enqueue_one(track("b", 30_000)).unwrap();

        assert_eq!(queue.total_duration(), Duration::from_secs(60));
        assert!(queue.enqueue_one(track("c", 1)).is_err());
    }

    #[test]
    fn stream_lengths_do_not_overflow() {
        let mut queue = TrackQueue::default();
        let stream = track("radio", u64::MAX);

        assert!(queue.enqueue_one(stream.clone()).is_err());
        assert!(queue.enqueue_many(vec![stream.clone(), stream]).is_err());
        assert!(queue.is_empty());
    }

    #[test]
    fn dequeue_is_fifo_and_updates_total() {
        let mut queue = TrackQueue::default();
        queue
            .enqueue_many(vec![track("a", 1_000), track("b", 2_000)])
            .unwrap();

        assert_eq!(queue.dequeue_next().unwrap().title, "a");
        assert_eq!(queue.total_duration(), Duration::from_millis(2_000));
        assert_eq!(queue.dequeue_next().unwrap().title, "b");
        assert_eq!(queue.total_duration(), Duration::ZERO);
        assert_eq!(queue.dequeue_next(), None);
    }

    #[test]
    fn total_is_consistent_after_mixed_operations() {
        let mut queue = TrackQueue::new(Duration::from_secs(100));
        let operations: Vec<Box<dyn Fn(&mut TrackQueue)>> = vec![
            Box::new(|q| {
                let _ = q.enqueue_one(track("a", 40_000));
            }),
            Box::new(|q| {
                let _ = q.enqueue_many(vec![track("b", 30_000), track("c", 40_000)]);
            }),
            Box::new(|q| {
                q.dequeue_next();
            }),
            Box::new(|q| {
                let _ = q.enqueue_many(vec![track("d", 20_000), track("e", 20_000)]);
            }),
            Box::new(|q| {
                let _ = q.enqueue_one(track("f", 50_000));
            }),
        ];

        for operation in operations {
            operation(&mut queue);
            let summed: Duration = queue.peek_all().iter().map(|t| t.length).sum();
            assert_eq!(queue.total_duration(), summed);
            assert!(queue.total_duration() <= queue.max_duration());
        }
    }

    #[test]
    fn snapshot_is_detached_from_the_queue() {
        let mut queue = TrackQueue::default();
        queue.enqueue_one(track("a", 1_000)).unwrap();

        let mut snapshot = queue.peek_all();
        snapshot.clear();

        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn clear_resets_total() {
        let mut queue = TrackQueue::default();
        queue.enqueue_one(track("a", 1_000)).unwrap();
        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.total_duration(), Duration::ZERO);
    }
}
