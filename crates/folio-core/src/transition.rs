use crate::{FollowState, LikeState};

/// A pure optimistic state change and its inverse.
///
/// Both sides must be synchronous and infallible. `rollback` restores values
/// captured when the transition was built, so applying it twice is the same
/// as applying it once.
pub trait Transition<S> {
    fn apply(&self, current: &S) -> S;
    fn rollback(&self, current: &S) -> S;
}

/// Like/unlike toggle built from the state the user clicked on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LikeToggle {
    before: LikeState,
}

impl LikeToggle {
    pub fn from_clicked(before: LikeState) -> Self {
        Self { before }
    }

    /// `true` when the click is a like, `false` when it is an unlike.
    pub fn likes(&self) -> bool {
        !self.before.liked
    }
}

impl Transition<LikeState> for LikeToggle {
    fn apply(&self, _current: &LikeState) -> LikeState {
        if self.before.liked {
            LikeState::new(false, self.before.likes.saturating_sub(1))
        } else {
            LikeState::new(true, self.before.likes + 1)
        }
    }

    fn rollback(&self, _current: &LikeState) -> LikeState {
        self.before
    }
}

/// Follow/unfollow toggle built from the state the user clicked on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FollowToggle {
    before: FollowState,
}

impl FollowToggle {
    pub fn from_clicked(before: FollowState) -> Self {
        Self { before }
    }

    pub fn follows(&self) -> bool {
        !self.before.following
    }
}

impl Transition<FollowState> for FollowToggle {
    fn apply(&self, _current: &FollowState) -> FollowState {
        if self.before.following {
            FollowState::new(false, self.before.followers.saturating_sub(1))
        } else {
            FollowState::new(true, self.before.followers + 1)
        }
    }

    fn rollback(&self, _current: &FollowState) -> FollowState {
        self.before
    }
}
