//! IAM integration tests - actually call AWS APIs
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```
//! AWS_PROFILE=your_profile cargo test --test aws_iam_integration -- --ignored
//! ```
//!
//! The credentials need iam:List*, iam:Get*, iam:CreateUser, iam:TagUser,
//! iam:PutUserPermissionsBoundary, iam:DeleteUserPermissionsBoundary and
//! iam:DeleteUser.

use iamwatch::aws::{AwsContext, AwsIamConnector, FromAwsContext, IamClient, get_current_account_id};
use iamwatch::watcher::{IamUserWatcher, Watcher, WatcherBase};
use iamwatch_common::{Account, AccountRegistry, IgnoreRegistry, UserRecord};
use iamwatch_test_utils::{get_test_region, test_user_name};

/// Test listing users in the caller's account
#[tokio::test]
#[ignore]
async fn test_list_users() {
    let region = get_test_region();
    let client = IamClient::from_context(&AwsContext::new(&region).await);

    let users = client.list_users().await.expect("Should list users");

    for user in &users {
        assert!(user.arn.starts_with("arn:aws:iam::"));
        assert!(user.attribute("UserId").is_some());
    }
}

/// Test fetching a freshly created user end to end
///
/// This test verifies:
/// 1. The created user shows up in the listing
/// 2. The fetched record carries the enriched attributes
/// 3. A user without a console password has no LoginProfile
#[tokio::test]
#[ignore]
async fn test_get_created_user() {
    let region = get_test_region();
    let aws = AwsContext::new(&region).await;
    let sdk = aws.iam_client();
    let client = IamClient::from_context(&aws);

    let name = test_user_name();
    sdk.create_user()
        .user_name(&name)
        .tags(
            aws_sdk_iam::types::Tag::builder()
                .key("purpose")
                .value("iamwatch-integration")
                .build()
                .expect("tag"),
        )
        .send()
        .await
        .expect("Should create test user");

    let listed = client.list_users().await.expect("Should list users");
    let user = listed
        .iter()
        .find(|u| u.user_name == name)
        .cloned()
        .unwrap_or_else(|| UserRecord::new(&name, ""));

    let fetched = client.get_user(&user).await;

    // Clean up before asserting so a failure doesn't leak the user
    sdk.delete_user()
        .user_name(&name)
        .send()
        .await
        .expect("Should delete test user");

    let fetched = fetched.expect("Should fetch test user");
    assert_eq!(fetched.user_name, name);
    assert_eq!(fetched.attribute("_version"), Some(&serde_json::json!(1)));
    assert_eq!(fetched.attribute("AccessKeys"), Some(&serde_json::json!([])));
    assert_eq!(fetched.attribute("Groups"), Some(&serde_json::json!([])));
    assert!(fetched.attribute("LoginProfile").is_none());
    assert_eq!(
        fetched.attribute("Tags"),
        Some(&serde_json::json!({"purpose": "iamwatch-integration"}))
    );
}

/// Test that a permissions boundary, which ListUsers omits, is fetched
#[tokio::test]
#[ignore]
async fn test_get_user_with_permissions_boundary() {
    const BOUNDARY: &str = "arn:aws:iam::aws:policy/ReadOnlyAccess";

    let region = get_test_region();
    let aws = AwsContext::new(&region).await;
    let sdk = aws.iam_client();
    let client = IamClient::from_context(&aws);

    let name = test_user_name();
    sdk.create_user()
        .user_name(&name)
        .send()
        .await
        .expect("Should create test user");
    sdk.put_user_permissions_boundary()
        .user_name(&name)
        .permissions_boundary(BOUNDARY)
        .send()
        .await
        .expect("Should attach permissions boundary");

    let listed = client.list_users().await.expect("Should list users");
    let user = listed
        .iter()
        .find(|u| u.user_name == name)
        .cloned()
        .unwrap_or_else(|| UserRecord::new(&name, ""));

    let fetched = client.get_user(&user).await;

    sdk.delete_user_permissions_boundary()
        .user_name(&name)
        .send()
        .await
        .expect("Should remove permissions boundary");
    sdk.delete_user()
        .user_name(&name)
        .send()
        .await
        .expect("Should delete test user");

    let fetched = fetched.expect("Should fetch test user");
    assert_eq!(
        fetched.attribute("PermissionsBoundary"),
        Some(&serde_json::json!({
            "PermissionsBoundaryArn": BOUNDARY,
            "PermissionsBoundaryType": "PermissionsBoundaryPolicy",
        }))
    );
}

/// Test a full slurp of the caller's own account with account verification
#[tokio::test]
#[ignore]
async fn test_slurp_own_account() {
    let region = get_test_region();
    let aws = AwsContext::new(&region).await;
    let account_id = get_current_account_id(aws.sdk_config())
        .await
        .expect("Should get caller identity");

    let mut account = Account::new("integration", account_id.as_str());
    account.regions = vec![region];
    let accounts = AccountRegistry::new(vec![account]).expect("valid account");

    let base = WatcherBase::new(accounts, None, IgnoreRegistry::default());
    let mut watcher = IamUserWatcher::new(
        base,
        AwsIamConnector {
            verify_account: true,
        },
    );

    let output = watcher.slurp().await;

    assert!(
        output.exceptions.is_empty(),
        "unexpected exceptions: {:?}",
        output.exceptions
    );
    for item in &output.items {
        assert_eq!(item.index, "iamuser");
        assert_eq!(item.region, "universal");
        assert_eq!(item.account, "integration");
        assert_eq!(item.name, item.new_config.user_name);
    }
}

/// Test that a mismatched account number is recorded, not raised
#[tokio::test]
#[ignore]
async fn test_slurp_wrong_account_records_connection_failure() {
    let accounts = AccountRegistry::new(vec![Account::new("wrong", "000000000000")])
        .expect("valid account");
    let base = WatcherBase::new(accounts, None, IgnoreRegistry::default());
    let mut watcher = IamUserWatcher::new(
        base,
        AwsIamConnector {
            verify_account: true,
        },
    );

    let output = watcher.slurp().await;

    assert!(output.items.is_empty());
    assert_eq!(output.exceptions.len(), 1);
}
