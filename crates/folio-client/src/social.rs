//! Like and follow buttons: the call sites of the optimistic executor.

use std::sync::Arc;

use folio_core::{
    AuthorId, BiteId, Fingerprint, FollowState, FollowToggle, LikeState, LikeToggle, RegionId, RemoteError,
    RetryPolicy, UserId,
};
use folio_store::{row, Query, RemoteStore};
use serde_json::json;

use crate::{now_unix, with_retry, MutationRequest};

pub const LIKES: &str = "likes";
pub const FOLLOWS: &str = "follows";

pub fn like_fingerprint(bite: &BiteId) -> Fingerprint {
    Fingerprint::new("like", format!("bite-{bite}"))
}

pub fn bite_region(bite: &BiteId) -> RegionId {
    RegionId::new("quick-bites", bite)
}

pub fn follow_fingerprint(author: &AuthorId) -> Fingerprint {
    Fingerprint::new("follow", format!("author-{author}"))
}

pub fn author_region(author: &AuthorId) -> RegionId {
    RegionId::new("authors", author)
}

/// Like or unlike `bite`, depending on what the user saw when clicking.
pub fn toggle_like(
    store: Arc<dyn RemoteStore>,
    user: &UserId,
    bite: &BiteId,
    clicked: LikeState,
) -> MutationRequest<LikeState, ()> {
    let toggle = LikeToggle::from_clicked(clicked);
    let (user, bite_id) = (user.clone(), bite.clone());
    MutationRequest::from_transition(like_fingerprint(bite), toggle, move || async move {
        if toggle.likes() {
            let like = row([
                ("user_id", json!(user.as_str())),
                ("bite_id", json!(bite_id.as_str())),
                ("created_at", json!(now_unix())),
            ]);
            store.insert(LIKES, like).await?;
        } else {
            let query = Query::table(LIKES).eq("user_id", user.as_str()).eq("bite_id", bite_id.as_str());
            store.delete(&query).await?;
        }
        Ok::<(), RemoteError>(())
    })
    .invalidate(bite_region(bite))
}

/// Follow or unfollow `author`, depending on what the user saw when clicking.
pub fn toggle_follow(
    store: Arc<dyn RemoteStore>,
    follower: &UserId,
    author: &AuthorId,
    clicked: FollowState,
) -> MutationRequest<FollowState, ()> {
    let toggle = FollowToggle::from_clicked(clicked);
    let (follower, author_id) = (follower.clone(), author.clone());
    MutationRequest::from_transition(follow_fingerprint(author), toggle, move || async move {
        if toggle.follows() {
            let follow = row([
                ("follower_id", json!(follower.as_str())),
                ("following_id", json!(author_id.as_str())),
                ("created_at", json!(now_unix())),
            ]);
            store.insert(FOLLOWS, follow).await?;
        } else {
            let query =
                Query::table(FOLLOWS).eq("follower_id", follower.as_str()).eq("following_id", author_id.as_str());
            store.delete(&query).await?;
        }
        Ok::<(), RemoteError>(())
    })
    .invalidate(author_region(author))
}

/// Current like button state for `user` on `bite`, as rendered on first load.
pub async fn load_like_state(
    store: &dyn RemoteStore,
    user: &UserId,
    bite: &BiteId,
    policy: &RetryPolicy,
) -> Result<LikeState, RemoteError> {
    let all = Query::table(LIKES).eq("bite_id", bite.as_str());
    let mine = all.clone().eq("user_id", user.as_str());
    let likes = with_retry(policy, LIKES, || store.count(&all)).await?;
    let liked = with_retry(policy, LIKES, || store.select_one(&mine)).await?.is_some();
    Ok(LikeState::new(liked, likes))
}

pub async fn load_follow_state(
    store: &dyn RemoteStore,
    follower: &UserId,
    author: &AuthorId,
    policy: &RetryPolicy,
) -> Result<FollowState, RemoteError> {
    let all = Query::table(FOLLOWS).eq("following_id", author.as_str());
    let mine = all.clone().eq("follower_id", follower.as_str());
    let followers = with_retry(policy, FOLLOWS, || store.count(&all)).await?;
    let following = with_retry(policy, FOLLOWS, || store.select_one(&mine)).await?.is_some();
    Ok(FollowState::new(following, followers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_the_entity() {
        let bite = BiteId::from_str("42");
        assert_eq!(like_fingerprint(&bite).as_str(), "like:bite-42");
        assert_eq!(bite_region(&bite).as_str(), "quick-bites:42");
        let author = AuthorId::from_str("7");
        assert_eq!(follow_fingerprint(&author).as_str(), "follow:author-7");
        assert_eq!(author_region(&author).as_str(), "authors:7");
    }
}
