use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug)]
pub struct Review {
    pub reviewer_id: u64,
    pub state: ReviewState,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approved,
    NotApproved,
    NoReviews,
}

/// Reduces a PR's full review history to a single verdict. The API returns
/// every review ever submitted, including ones supplanted by newer
/// submissions from the same reviewer, so only the latest per reviewer
/// counts. Reviews by the PR's own author never count.
pub fn evaluate_reviews(reviews: &[Review], author_id: u64) -> ReviewVerdict {
    let mut latest: HashMap<u64, (DateTime<Utc>, ReviewState)> = HashMap::new();

    for review in reviews {
        if review.reviewer_id == author_id {
            continue;
        }

        match latest.get_mut(&review.reviewer_id) {
            Some(entry) => {
                // Equal timestamps: the later entry in input order wins,
                // the API lists reviews chronologically.
                if review.submitted_at >= entry.0 {
                    *entry = (review.submitted_at, review.state);
                }
            }
            None => {
                latest.insert(review.reviewer_id, (review.submitted_at, review.state));
            }
        }
    }

    if latest.is_empty() {
        return ReviewVerdict::NoReviews;
    }

    if latest
        .values()
        .all(|(_, state)| *state == ReviewState::Approved)
    {
        ReviewVerdict::Approved
    } else {
        ReviewVerdict::NotApproved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(reviewer_id: u64, state: ReviewState, secs: i64) -> Review {
        Review {
            reviewer_id,
            state,
            submitted_at: DateTime::from_timestamp(secs, 0).unwrap(),
        }
    }

    #[test]
    fn no_reviews_at_all() {
        assert_eq!(evaluate_reviews(&[], 99), ReviewVerdict::NoReviews);
    }

    #[test]
    fn latest_review_per_reviewer_wins() {
        let reviews = vec![
            review(1, ReviewState::Approved, 10),
            review(2, ReviewState::ChangesRequested, 20),
            review(2, ReviewState::Approved, 30),
        ];

        assert_eq!(evaluate_reviews(&reviews, 99), ReviewVerdict::Approved);
    }

    #[test]
    fn stale_approval_does_not_count() {
        let reviews = vec![
            review(1, ReviewState::Approved, 10),
            review(1, ReviewState::ChangesRequested, 20),
        ];

        assert_eq!(evaluate_reviews(&reviews, 99), ReviewVerdict::NotApproved);
    }

    #[test]
    fn author_reviews_are_excluded() {
        let reviews = vec![
            review(1, ReviewState::Approved, 10),
            review(99, ReviewState::ChangesRequested, 20),
            review(99, ReviewState::Commented, 30),
        ];

        assert_eq!(evaluate_reviews(&reviews, 99), ReviewVerdict::Approved);
    }

    #[test]
    fn only_author_reviews_means_no_reviews() {
        let reviews = vec![review(99, ReviewState::Commented, 10)];

        assert_eq!(evaluate_reviews(&reviews, 99), ReviewVerdict::NoReviews);
    }

    #[test]
    fn comments_block_approval() {
        let reviews = vec![
            review(1, ReviewState::Approved, 10),
            review(2, ReviewState::Commented, 20),
        ];

        assert_eq!(evaluate_reviews(&reviews, 99), ReviewVerdict::NotApproved);
    }

    #[test]
    fn equal_timestamps_keep_the_last_seen() {
        let reviews = vec![
            review(1, ReviewState::ChangesRequested, 10),
            review(1, ReviewState::Approved, 10),
        ];

        assert_eq!(evaluate_reviews(&reviews, 99), ReviewVerdict::Approved);
    }
}
