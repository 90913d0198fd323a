//! Concurrent first-contact resolution

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;

use ng_control::auth::{AuthClaims, PrincipalResolver};
use ng_control::store::InMemoryAccountManager;
use ng_core::traits::AccountManager;
use ng_core::UserId;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_contact_creates_one_account() {
    let manager = Arc::new(InMemoryAccountManager::new());
    let resolver = Arc::new(PrincipalResolver::new(manager.clone(), "netgate.test"));

    let tasks = (0..64).map(|_| {
        let resolver = resolver.clone();
        tokio::spawn(async move { resolver.resolve(&AuthClaims::new("newcomer")).await })
    });
    let results = join_all(tasks).await;

    let ids: HashSet<_> = results
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().id)
        .collect();
    assert_eq!(ids.len(), 1);
    assert_eq!(manager.len(), 1);

    let stored = manager
        .get_account_by_user(&UserId::new("newcomer"))
        .await
        .unwrap();
    assert!(ids.contains(&stored.id));
    assert_eq!(stored.users.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_users_get_distinct_accounts() {
    let manager = Arc::new(InMemoryAccountManager::new());
    let resolver = Arc::new(PrincipalResolver::new(manager.clone(), "netgate.test"));

    let tasks = (0..16).flat_map(|i| {
        (0..4).map(move |_| format!("user-{i}")).collect::<Vec<_>>()
    });
    let handles = tasks.map(|user| {
        let resolver = resolver.clone();
        tokio::spawn(async move {
            let account = resolver.resolve(&AuthClaims::new(user.as_str())).await.unwrap();
            (user, account.id)
        })
    });

    let mut by_user = std::collections::HashMap::new();
    for joined in join_all(handles).await {
        let (user, account_id) = joined.unwrap();
        let previous = by_user.insert(user, account_id.clone());
        if let Some(previous) = previous {
            assert_eq!(previous, account_id);
        }
    }
    assert_eq!(by_user.len(), 16);
    assert_eq!(manager.len(), 16);
}
