use serde::{Deserialize, Serialize};

/// What a like button renders.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub likes: u64,
}

impl LikeState {
    pub fn new(liked: bool, likes: u64) -> Self {
        Self { liked, likes }
    }
}

/// What a follow button renders.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FollowState {
    pub following: bool,
    pub followers: u64,
}

impl FollowState {
    pub fn new(following: bool, followers: u64) -> Self {
        Self { following, followers }
    }
}
