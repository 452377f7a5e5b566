//! Group syncer tests: listing, entitlements, grant and revoke.

mod common;

use common::*;
use std::sync::{Arc, Mutex};
use xavyo_connector::prelude::*;
use xavyo_connector_metabase::models::MembershipRequest;
use xavyo_connector_metabase::ClientResponse;

fn group_resource(id: &str, name: &str) -> Resource {
    Resource::reference(ResourceId::new("group", id), name)
}

fn user_resource(id: &str) -> Resource {
    Resource::reference(ResourceId::new("user", id), "John Doe")
}

fn member_grant(group_id: &str, user_id: &str) -> Grant {
    let entitlement = Entitlement::assignment(&group_resource(group_id, "Developers"), "member");
    Grant::new(entitlement, user_resource(user_id))
}

// =============================================================================
// List
// =============================================================================

#[tokio::test]
async fn test_list_groups() {
    let mock = Arc::new(MockDirectoryClient::new().on_list_groups(|| {
        ClientResponse::ok(vec![group(1, "All Users", 3), group(2, "Admins", 1)])
    }));
    let connector = connector(&mock);

    let outcome = connector.groups().list(None, &PageToken::first()).await;
    assert!(outcome.annotations.is_empty());

    let page = outcome.result.unwrap();
    let names: Vec<&str> = page.items.iter().map(|r| r.display_name.as_str()).collect();
    assert_eq!(names, vec!["All Users", "Admins"]);
    assert!(page.next_page_token.is_empty());
    assert_eq!(
        page.items[0].profile_value("member_count"),
        Some(&serde_json::json!(3))
    );
}

#[tokio::test]
async fn test_list_groups_empty() {
    let mock = Arc::new(MockDirectoryClient::new().on_list_groups(|| ClientResponse::ok(vec![])));
    let page = connector(&mock)
        .groups()
        .list(None, &PageToken::first())
        .await
        .result
        .unwrap();
    assert!(page.items.is_empty());
    assert!(!page.has_more());
}

#[tokio::test]
async fn test_list_groups_failure_keeps_rate_limit() {
    let mock = Arc::new(MockDirectoryClient::new().on_list_groups(|| {
        ClientResponse::err(api_error(429, "ratelimit error groups")).with_rate_limit(rate_limit(10))
    }));

    let outcome = connector(&mock).groups().list(None, &PageToken::first()).await;
    let err = outcome.result.unwrap_err();
    assert!(err.to_string().starts_with("failed to list groups: "));
    assert!(err.to_string().contains("ratelimit error groups"));
    assert_eq!(
        outcome.annotations.rate_limit().and_then(|rl| rl.limit),
        Some(10)
    );
}

#[tokio::test]
async fn test_list_groups_api_error() {
    let mock = Arc::new(
        MockDirectoryClient::new()
            .on_list_groups(|| ClientResponse::err(api_error(500, "API error"))),
    );

    let outcome = connector(&mock).groups().list(None, &PageToken::first()).await;
    assert_eq!(
        outcome.result.unwrap_err().to_string(),
        "failed to list groups: Metabase API error: 500 - API error"
    );
    assert!(outcome.annotations.is_empty());
}

#[tokio::test]
async fn test_list_groups_missing_id_is_error() {
    let mock = Arc::new(
        MockDirectoryClient::new()
            .on_list_groups(|| ClientResponse::ok(vec![group(1, "All Users", 3), group(0, "Broken", 0)])),
    );

    let outcome = connector(&mock).groups().list(None, &PageToken::first()).await;
    assert!(outcome.result.is_err());
}

// =============================================================================
// Entitlements
// =============================================================================

#[tokio::test]
async fn test_entitlements_paid_plan() {
    let mock = Arc::new(MockDirectoryClient::new().with_paid_plan(true));
    let page = connector(&mock)
        .groups()
        .entitlements(&group_resource("1", "All Users"), &PageToken::first())
        .await
        .result
        .unwrap();

    let ids: Vec<&str> = page.items.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["group:1:member", "group:1:manager"]);
    assert_eq!(page.items[1].display_name, "All Users Manager");
    assert_eq!(
        page.items[1].description,
        "Is a Manager of All Users group in Metabase"
    );
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_entitlements_free_plan() {
    let mock = Arc::new(MockDirectoryClient::new().with_paid_plan(false));
    let page = connector(&mock)
        .groups()
        .entitlements(&group_resource("1", "All Users"), &PageToken::first())
        .await
        .result
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, "group:1:member");
    assert_eq!(page.items[0].grantable_to, vec!["user".to_string()]);
}

#[tokio::test]
async fn test_entitlements_follow_plan_changes() {
    let mock = Arc::new(MockDirectoryClient::new());
    let groups = connector(&mock).groups();
    let all_users = group_resource("1", "All Users");

    let before = groups.entitlements(&all_users, &PageToken::first()).await;
    mock.set_paid_plan(true);
    let after = groups.entitlements(&all_users, &PageToken::first()).await;

    assert_eq!(before.result.unwrap().items.len(), 1);
    assert_eq!(after.result.unwrap().items.len(), 2);
}

#[tokio::test]
async fn test_group_grants_are_empty() {
    let mock = Arc::new(MockDirectoryClient::new());
    let page = connector(&mock)
        .groups()
        .grants(&group_resource("3", "Developers"), &PageToken::first())
        .await
        .result
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(mock.call_count(), 0);
}

// =============================================================================
// Grant
// =============================================================================

#[tokio::test]
async fn test_grant_member() {
    let mock = Arc::new(MockDirectoryClient::new().on_add_user_to_group(|_| ClientResponse::ok(())));
    let groups = connector(&mock).groups();
    let entitlement = Entitlement::assignment(&group_resource("3", "Developers"), "member");

    let outcome = groups.grant(&user_resource("12"), &entitlement).await;
    assert!(outcome.is_ok());
    assert_eq!(
        mock.calls(),
        vec![Call::AddUserToGroup(MembershipRequest {
            group_id: 3,
            user_id: 12,
            is_group_manager: false,
        })]
    );
}

#[tokio::test]
async fn test_grant_manager() {
    let mock = Arc::new(MockDirectoryClient::new().on_add_user_to_group(|req| {
        assert!(req.is_group_manager);
        ClientResponse::ok(())
    }));
    let entitlement = Entitlement::assignment(&group_resource("3", "Developers"), "manager");

    let outcome = connector(&mock)
        .groups()
        .grant(&user_resource("12"), &entitlement)
        .await;
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn test_grant_bare_entitlement_id() {
    let mock = Arc::new(MockDirectoryClient::new().on_add_user_to_group(|_| ClientResponse::ok(())));
    let mut entitlement = Entitlement::assignment(&group_resource("3", "Developers"), "");
    entitlement.id = "manager".to_string();

    let outcome = connector(&mock)
        .groups()
        .grant(&user_resource("12"), &entitlement)
        .await;
    assert!(outcome.is_ok());
    assert!(matches!(
        mock.calls()[0],
        Call::AddUserToGroup(MembershipRequest {
            is_group_manager: true,
            ..
        })
    ));
}

#[tokio::test]
async fn test_grant_unsupported_entitlement() {
    let mock = Arc::new(MockDirectoryClient::new());
    let entitlement = Entitlement::assignment(&group_resource("3", "Developers"), "owner");

    let outcome = connector(&mock)
        .groups()
        .grant(&user_resource("12"), &entitlement)
        .await;
    let err = outcome.result.unwrap_err();
    assert_eq!(err.to_string(), "unsupported entitlement id \"group:3:owner\"");
    assert!(err.is_validation());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_grant_malformed_ids() {
    let mock = Arc::new(MockDirectoryClient::new());
    let groups = connector(&mock).groups();

    let entitlement = Entitlement::assignment(&group_resource("abc", "Developers"), "member");
    let err = groups
        .grant(&user_resource("12"), &entitlement)
        .await
        .result
        .unwrap_err();
    assert!(err.to_string().starts_with("invalid group id \"abc\""));

    let entitlement = Entitlement::assignment(&group_resource("3", "Developers"), "member");
    let err = groups
        .grant(&user_resource("john"), &entitlement)
        .await
        .result
        .unwrap_err();
    assert!(err.to_string().starts_with("invalid user id \"john\""));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_grant_rate_limited() {
    let mock = Arc::new(MockDirectoryClient::new().on_add_user_to_group(|_| {
        ClientResponse::err(api_error(429, "rate limited")).with_rate_limit(rate_limit(10))
    }));
    let entitlement = Entitlement::assignment(&group_resource("3", "Developers"), "member");

    let outcome = connector(&mock)
        .groups()
        .grant(&user_resource("12"), &entitlement)
        .await;
    let err = outcome.result.unwrap_err();
    assert!(err.to_string().starts_with("failed to grant user 12 to group 3: "));
    assert!(err.to_string().contains("rate limited"));
    assert!(outcome.annotations.has_rate_limit());
}

#[tokio::test]
async fn test_grant_twice_calls_backend_twice() {
    let mock = Arc::new(MockDirectoryClient::new().on_add_user_to_group(|_| ClientResponse::ok(())));
    let groups = connector(&mock).groups();
    let entitlement = Entitlement::assignment(&group_resource("3", "Developers"), "member");

    assert!(groups.grant(&user_resource("12"), &entitlement).await.is_ok());
    assert!(groups.grant(&user_resource("12"), &entitlement).await.is_ok());
    assert_eq!(mock.call_count(), 2);
}

// =============================================================================
// Revoke
// =============================================================================

#[tokio::test]
async fn test_revoke() {
    let mock = Arc::new(
        MockDirectoryClient::new()
            .on_list_memberships(|| ClientResponse::ok(listing(vec![membership(101, 3, 12, false)])))
            .on_remove_user_from_group(|id| {
                assert_eq!(*id, 101);
                ClientResponse::ok(())
            }),
    );

    let outcome = connector(&mock).groups().revoke(&member_grant("3", "12")).await;
    assert!(outcome.is_ok());
    assert_eq!(
        mock.calls(),
        vec![Call::ListMemberships, Call::RemoveUserFromGroup(101)]
    );
}

#[tokio::test]
async fn test_revoke_picks_matching_membership() {
    let mock = Arc::new(
        MockDirectoryClient::new()
            .on_list_memberships(|| {
                ClientResponse::ok(listing(vec![
                    membership(200, 2, 12, false),
                    membership(101, 3, 12, false),
                    membership(102, 3, 13, false),
                ]))
            })
            .on_remove_user_from_group(|_| ClientResponse::ok(())),
    );

    let outcome = connector(&mock).groups().revoke(&member_grant("3", "12")).await;
    assert!(outcome.is_ok());
    assert_eq!(mock.calls()[1], Call::RemoveUserFromGroup(101));
}

#[tokio::test]
async fn test_revoke_manager_removes_membership() {
    let mock = Arc::new(
        MockDirectoryClient::new()
            .on_list_memberships(|| ClientResponse::ok(listing(vec![membership(101, 3, 12, true)])))
            .on_remove_user_from_group(|_| ClientResponse::ok(())),
    );
    let entitlement = Entitlement::assignment(&group_resource("3", "Developers"), "manager");
    let grant = Grant::new(entitlement, user_resource("12"));

    assert!(connector(&mock).groups().revoke(&grant).await.is_ok());
    assert_eq!(mock.calls()[1], Call::RemoveUserFromGroup(101));
}

#[tokio::test]
async fn test_revoke_nonexistent_is_ok() {
    let mock = Arc::new(
        MockDirectoryClient::new()
            .on_list_memberships(|| ClientResponse::ok(listing(vec![membership(102, 3, 13, false)]))),
    );
    let groups = connector(&mock).groups();

    assert!(groups.revoke(&member_grant("3", "12")).await.is_ok());
    assert!(groups.revoke(&member_grant("3", "12")).await.is_ok());
    assert_eq!(mock.calls(), vec![Call::ListMemberships, Call::ListMemberships]);
}

#[tokio::test]
async fn test_revoke_twice_after_delete_is_ok() {
    let rows = Arc::new(Mutex::new(vec![
        membership(101, 3, 12, false),
        membership(102, 3, 13, false),
    ]));
    let listed = rows.clone();
    let mock = Arc::new(
        MockDirectoryClient::new()
            .on_list_memberships(move || ClientResponse::ok(listing(listed.lock().unwrap().clone())))
            .on_remove_user_from_group(move |id| {
                rows.lock().unwrap().retain(|m| m.membership_id != *id);
                ClientResponse::ok(())
            }),
    );
    let groups = connector(&mock).groups();

    assert!(groups.revoke(&member_grant("3", "12")).await.is_ok());
    assert!(groups.revoke(&member_grant("3", "12")).await.is_ok());
    assert_eq!(
        mock.calls(),
        vec![
            Call::ListMemberships,
            Call::RemoveUserFromGroup(101),
            Call::ListMemberships,
        ]
    );
}

#[tokio::test]
async fn test_revoke_listing_failure() {
    let mock = Arc::new(MockDirectoryClient::new().on_list_memberships(|| {
        ClientResponse::err(api_error(503, "unavailable")).with_rate_limit(rate_limit(5))
    }));

    let outcome = connector(&mock).groups().revoke(&member_grant("3", "12")).await;
    let err = outcome.result.unwrap_err();
    assert!(err.to_string().starts_with("failed to list memberships: "));
    assert!(err.is_transient());
    assert!(outcome.annotations.has_rate_limit());
    assert_eq!(mock.calls(), vec![Call::ListMemberships]);
}

#[tokio::test]
async fn test_revoke_delete_failure_keeps_both_rate_limits() {
    let mock = Arc::new(
        MockDirectoryClient::new()
            .on_list_memberships(|| {
                ClientResponse::ok(listing(vec![membership(101, 3, 12, false)]))
                    .with_rate_limit(rate_limit(100))
            })
            .on_remove_user_from_group(|_| {
                ClientResponse::err(api_error(429, "slow down")).with_rate_limit(rate_limit(99))
            }),
    );

    let outcome = connector(&mock).groups().revoke(&member_grant("3", "12")).await;
    let err = outcome.result.unwrap_err();
    assert!(err
        .to_string()
        .starts_with("failed to revoke user 12 from group 3: "));
    assert_eq!(outcome.annotations.len(), 2);
    assert_eq!(
        outcome.annotations.rate_limit().and_then(|rl| rl.limit),
        Some(99)
    );
}

#[tokio::test]
async fn test_revoke_malformed_principal() {
    let mock = Arc::new(MockDirectoryClient::new());
    let outcome = connector(&mock).groups().revoke(&member_grant("3", "john")).await;
    assert!(outcome.result.unwrap_err().is_validation());
    assert_eq!(mock.call_count(), 0);
}
