//! Demo data
//!
//! Seeds a small, fixed cast of users, posts, and follows so a fresh
//! server has something to show. Seeding is idempotent: users that already
//! exist are left alone (their posts are not re-added) and existing follow
//! edges are skipped.

use crate::error::{Result, SocialError};
use crate::service::SocialService;

const DEMO_PASSWORD: &str = "pass";

const DEMO_USERS: &[(&str, &[&str])] = &[
    ("harsh", &["hi ads", "heasd asdas daD23123213"]),
    ("mihir", &["hasdf sdf easd aasdfsdas daD23123213"]),
    ("harshit", &["sdf easd aasdfsdas daD23123213"]),
];

const DEMO_FOLLOWS: &[(&str, &str)] = &[("harsh", "mihir"), ("harsh", "harshit")];

/// What a seeding run added
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Users created
    pub users: usize,
    /// Posts created
    pub posts: usize,
    /// Follow edges created
    pub follows: usize,
}

/// Insert the demo users, posts, and follows that are not there yet
pub async fn seed_demo_data(service: &SocialService) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for (username, posts) in DEMO_USERS {
        let user = match service.identity().register(username, DEMO_PASSWORD).await {
            Ok(user) => user,
            Err(SocialError::AlreadyExists(_)) => continue,
            Err(e) => return Err(e),
        };
        report.users += 1;

        for content in posts.iter() {
            service.posts().create_post(&user, content).await?;
            report.posts += 1;
        }
    }

    for (follower, followee) in DEMO_FOLLOWS {
        match service.graph().follow(follower, followee).await {
            Ok(()) => report.follows += 1,
            Err(SocialError::AlreadyFollowing(_)) => {}
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        users = report.users,
        posts = report.posts,
        follows = report.follows,
        "Seeded demo data"
    );

    Ok(report)
}
