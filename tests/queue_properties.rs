//! Property tests for queue navigation.

use crusty_queue::player::queue::Queue;
use crusty_queue::youtube::search::SearchResult;
use proptest::prelude::*;

fn queue_of(len: usize) -> Queue {
    let mut queue = Queue::new();
    queue.replace(
        (0..len)
            .map(|i| SearchResult::new(format!("id{}", i), format!("Track {}", i), ""))
            .collect(),
    );
    queue
}

proptest! {
    /// Property: N calls to next() on a queue of N come back to the start
    #[test]
    fn next_wraps_around(len in 1usize..40, start in 0usize..40) {
        let start = start % len;
        let mut queue = queue_of(len);
        queue.select_by_id(&format!("id{}", start));

        for _ in 0..len {
            prop_assert!(queue.next().is_some());
            let index = queue.current_index().unwrap();
            prop_assert!(index < len);
        }
        prop_assert_eq!(queue.current_index(), Some(start));
    }

    /// Property: previous() undoes next() and vice versa
    #[test]
    fn previous_inverts_next(len in 1usize..40, start in 0usize..40) {
        let start = start % len;
        let mut queue = queue_of(len);
        queue.select_by_id(&format!("id{}", start));

        queue.next();
        let back = queue.previous().unwrap();
        prop_assert_eq!(queue.current_index(), Some(start));
        prop_assert_eq!(back.id, format!("id{}", start));

        queue.previous();
        queue.next();
        prop_assert_eq!(queue.current_index(), Some(start));
    }

    /// Property: whatever the old selection, navigation after a shrink stays in bounds
    #[test]
    fn shrink_never_breaks_bounds(old_len in 1usize..40, old_pick in 0usize..40, new_len in 1usize..40, forward in any::<bool>()) {
        let mut queue = queue_of(old_len);
        queue.select_by_id(&format!("id{}", old_pick % old_len));

        queue.replace(queue_of(new_len).items().to_vec());

        let moved = if forward { queue.next() } else { queue.previous() };
        prop_assert!(moved.is_some());
        prop_assert!(queue.current_index().unwrap() < new_len);
        prop_assert!(queue.current().is_some());
    }

    /// Property: select_by_id lands on the id's position, misses change nothing
    #[test]
    fn select_by_id_matches_position(len in 1usize..40, pick in 0usize..40, before in 0usize..40) {
        let pick = pick % len;
        let mut queue = queue_of(len);
        queue.select_by_id(&format!("id{}", before % len));

        prop_assert_eq!(queue.select_by_id(&format!("id{}", pick)), Some(pick));
        prop_assert_eq!(queue.current_index(), Some(pick));

        prop_assert_eq!(queue.select_by_id("absent"), None);
        prop_assert_eq!(queue.current_index(), Some(pick));
    }
}
