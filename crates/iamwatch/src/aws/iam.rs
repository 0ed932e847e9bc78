//! IAM user listing and configuration fetching
//!
//! `IamClient` wraps the IAM SDK client and turns its responses into
//! [`UserRecord`]s. The listing call returns base attributes only; the fetch
//! call adds access keys, policies, groups, credentials and tags.

use crate::aws::account::verify_account;
use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::api_error;
use anyhow::{Context, Result, anyhow};
use aws_sdk_iam::Client;
use aws_sdk_iam::primitives::DateTime;
use aws_sdk_iam::types::{AccessKeyLastUsed, LoginProfile, StatusType, User};
use iamwatch_common::defaults::USER_RECORD_VERSION;
use iamwatch_common::{SlurpContext, UserRecord};
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value, json};
use tracing::debug;

/// IAM client for reading user configuration
pub struct IamClient {
    client: Client,
}

impl FromAwsContext for IamClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.iam_client(),
        }
    }
}

impl IamClient {
    /// List every user in the account, following pagination
    pub async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let mut users = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut request = self.client.list_users();
            if let Some(m) = &marker {
                request = request.marker(m);
            }

            let response = request
                .send()
                .await
                .map_err(|e| api_error("ListUsers", e))?;

            users.extend(response.users().iter().map(base_record));

            // Handle pagination
            if response.is_truncated() {
                marker = response.marker().map(|s| s.to_string());
            } else {
                break;
            }
        }

        debug!(count = users.len(), "Listed IAM users");
        Ok(users)
    }

    /// Fetch the full configuration of a listed user.
    ///
    /// The listed record's attributes are kept and the detail sections are
    /// added alongside them.
    pub async fn get_user(&self, user: &UserRecord) -> Result<UserRecord> {
        let name = user.user_name.as_str();
        let mut record = user.clone();

        // ListUsers omits some members (e.g. PermissionsBoundary), GetUser has them all
        let response = self
            .client
            .get_user()
            .user_name(name)
            .send()
            .await
            .map_err(|e| api_error("GetUser", e))?;
        let details: Option<&User> = response.user().into();
        if let Some(details) = details {
            apply_base(&mut record, details);
        }

        record.set_attribute("AccessKeys", self.access_keys(name).await?);
        record.set_attribute("ManagedPolicies", self.managed_policies(name).await?);
        record.set_attribute("InlinePolicies", self.inline_policies(name).await?);
        record.set_attribute("Groups", self.groups(name).await?);
        if let Some(profile) = self.login_profile(name).await? {
            record.set_attribute("LoginProfile", profile);
        }
        record.set_attribute("MfaDevices", self.mfa_devices(name).await?);
        record.set_attribute("SigningCertificates", self.signing_certificates(name).await?);
        record.set_attribute("SshPublicKeys", self.ssh_public_keys(name).await?);
        record.set_attribute("Tags", self.tags(name).await?);
        record.set_attribute("_version", USER_RECORD_VERSION);

        Ok(record)
    }

    async fn access_keys(&self, user_name: &str) -> Result<Value> {
        let response = self
            .client
            .list_access_keys()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| api_error("ListAccessKeys", e))?;

        let mut keys = Vec::new();
        for key in response.access_key_metadata() {
            let mut entry = Map::new();
            entry.insert("AccessKeyId".into(), json_str(key.access_key_id()));
            entry.insert("Status".into(), json_status(key.status()));
            entry.insert("CreateDate".into(), json_date(key.create_date()));

            if let Some(key_id) = key.access_key_id() {
                let last_used = self
                    .client
                    .get_access_key_last_used()
                    .access_key_id(key_id)
                    .send()
                    .await
                    .map_err(|e| api_error("GetAccessKeyLastUsed", e))?;

                let usage: Option<&AccessKeyLastUsed> = last_used.access_key_last_used().into();
                if let Some(usage) = usage {
                    entry.insert("LastUsedDate".into(), json_date(usage.last_used_date()));
                    entry.insert("LastUsedService".into(), json_str(usage.service_name()));
                    entry.insert("LastUsedRegion".into(), json_str(usage.region()));
                }
            }

            keys.push(Value::Object(entry));
        }

        Ok(Value::Array(keys))
    }

    async fn managed_policies(&self, user_name: &str) -> Result<Value> {
        let mut policies = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut request = self.client.list_attached_user_policies().user_name(user_name);
            if let Some(m) = &marker {
                request = request.marker(m);
            }

            let response = request
                .send()
                .await
                .map_err(|e| api_error("ListAttachedUserPolicies", e))?;

            for policy in response.attached_policies() {
                policies.push(json!({
                    "name": json_str(policy.policy_name()),
                    "arn": json_str(policy.policy_arn()),
                }));
            }

            if response.is_truncated() {
                marker = response.marker().map(|s| s.to_string());
            } else {
                break;
            }
        }

        Ok(Value::Array(policies))
    }

    async fn inline_policies(&self, user_name: &str) -> Result<Value> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut request = self.client.list_user_policies().user_name(user_name);
            if let Some(m) = &marker {
                request = request.marker(m);
            }

            let response = request
                .send()
                .await
                .map_err(|e| api_error("ListUserPolicies", e))?;

            names.extend(response.policy_names().iter().cloned());

            if response.is_truncated() {
                marker = response.marker().map(|s| s.to_string());
            } else {
                break;
            }
        }

        let mut policies = Map::new();
        for name in names {
            let response = self
                .client
                .get_user_policy()
                .user_name(user_name)
                .policy_name(&name)
                .send()
                .await
                .map_err(|e| api_error("GetUserPolicy", e))?;

            let document = decode_policy_document(response.policy_document())
                .with_context(|| format!("Inline policy {name} of user {user_name}"))?;
            policies.insert(name, document);
        }

        Ok(Value::Object(policies))
    }

    async fn groups(&self, user_name: &str) -> Result<Value> {
        let mut groups = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut request = self.client.list_groups_for_user().user_name(user_name);
            if let Some(m) = &marker {
                request = request.marker(m);
            }

            let response = request
                .send()
                .await
                .map_err(|e| api_error("ListGroupsForUser", e))?;

            groups.extend(response.groups().iter().map(|g| json_str(g.group_name())));

            if response.is_truncated() {
                marker = response.marker().map(|s| s.to_string());
            } else {
                break;
            }
        }

        Ok(Value::Array(groups))
    }

    /// Console password settings, or `None` for users without one
    async fn login_profile(&self, user_name: &str) -> Result<Option<Value>> {
        match self.client.get_login_profile().user_name(user_name).send().await {
            Ok(response) => {
                let profile: Option<&LoginProfile> = response.login_profile().into();
                Ok(profile.map(|p| {
                    json!({
                        "CreateDate": json_date(p.create_date()),
                        "PasswordResetRequired": p.password_reset_required(),
                    })
                }))
            }
            Err(e)
                if e.as_service_error()
                    .is_some_and(|s| s.is_no_such_entity_exception()) =>
            {
                Ok(None)
            }
            Err(e) => Err(api_error("GetLoginProfile", e)),
        }
    }

    async fn mfa_devices(&self, user_name: &str) -> Result<Value> {
        let response = self
            .client
            .list_mfa_devices()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| api_error("ListMFADevices", e))?;

        Ok(response
            .mfa_devices()
            .iter()
            .map(|d| {
                json!({
                    "SerialNumber": json_str(d.serial_number()),
                    "EnableDate": json_date(d.enable_date()),
                })
            })
            .collect())
    }

    async fn signing_certificates(&self, user_name: &str) -> Result<Value> {
        let response = self
            .client
            .list_signing_certificates()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| api_error("ListSigningCertificates", e))?;

        Ok(response
            .certificates()
            .iter()
            .map(|c| {
                json!({
                    "CertificateId": json_str(c.certificate_id()),
                    "Status": json_status(c.status()),
                    "UploadDate": json_date(c.upload_date()),
                })
            })
            .collect())
    }

    async fn ssh_public_keys(&self, user_name: &str) -> Result<Value> {
        let response = self
            .client
            .list_ssh_public_keys()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| api_error("ListSSHPublicKeys", e))?;

        Ok(response
            .ssh_public_keys()
            .iter()
            .map(|k| {
                json!({
                    "SshPublicKeyId": json_str(k.ssh_public_key_id()),
                    "Status": json_status(k.status()),
                    "UploadDate": json_date(k.upload_date()),
                })
            })
            .collect())
    }

    async fn tags(&self, user_name: &str) -> Result<Value> {
        let response = self
            .client
            .list_user_tags()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| api_error("ListUserTags", e))?;

        Ok(Value::Object(
            response
                .tags()
                .iter()
                .map(|t| (t.key().to_string(), Value::String(t.value().to_string())))
                .collect(),
        ))
    }
}

/// Build the base record for a listed user
fn base_record(user: &User) -> UserRecord {
    let mut record = UserRecord::new(user.user_name(), user.arn());
    apply_base(&mut record, user);
    record
}

/// Overwrite the record's identity and base attributes with `user`'s.
///
/// Attributes `user` doesn't carry are left as they were.
fn apply_base(record: &mut UserRecord, user: &User) {
    record.user_name = user.user_name().to_string();
    record.arn = user.arn().to_string();
    record.set_attribute("UserId", user.user_id());
    record.set_attribute("Path", user.path());
    record.set_attribute("CreateDate", json_date(user.create_date()));

    if let Some(last_used) = user.password_last_used() {
        record.set_attribute("PasswordLastUsed", json_date(last_used));
    }
    if let Some(boundary) = user.permissions_boundary() {
        record.set_attribute(
            "PermissionsBoundary",
            json!({
                "PermissionsBoundaryArn": json_str(boundary.permissions_boundary_arn()),
                "PermissionsBoundaryType": boundary
                    .permissions_boundary_type()
                    .map(|t| t.as_str()),
            }),
        );
    }
}

/// Policy documents come back URL-encoded
fn decode_policy_document(doc: &str) -> Result<Value> {
    let decoded = percent_decode_str(doc).decode_utf8()?.into_owned();
    serde_json::from_str(&decoded).map_err(|err| anyhow!("Failed to parse IAM policy document: {err}"))
}

// The SDK marks some members required and others optional; these accept both.

fn json_str<'a>(value: impl Into<Option<&'a str>>) -> Value {
    value
        .into()
        .map_or(Value::Null, |s| Value::String(s.to_string()))
}

fn json_date<'a>(value: impl Into<Option<&'a DateTime>>) -> Value {
    value
        .into()
        .and_then(|dt| chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
        .map_or(Value::Null, |dt| Value::String(dt.to_rfc3339()))
}

fn json_status<'a>(value: impl Into<Option<&'a StatusType>>) -> Value {
    value
        .into()
        .map_or(Value::Null, |s| Value::String(s.as_str().to_string()))
}

/// Trait for IAM operations that can be mocked in tests.
///
/// This trait abstracts the IAM client operations to enable unit testing
/// of watcher logic without hitting real AWS.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait IamOperations: Send + Sync {
    /// List every user in the account
    async fn list_users(&self) -> Result<Vec<UserRecord>>;

    /// Fetch the full configuration of a listed user
    async fn get_user(&self, user: &UserRecord) -> Result<UserRecord>;
}

impl IamOperations for IamClient {
    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        IamClient::list_users(self).await
    }

    async fn get_user(&self, user: &UserRecord) -> Result<UserRecord> {
        IamClient::get_user(self, user).await
    }
}

/// Builds an IAM client for one slurp context.
#[allow(async_fn_in_trait)]
pub trait IamConnector: Send + Sync {
    type Client: IamOperations;

    async fn connect(&self, ctx: &SlurpContext) -> Result<Self::Client>;
}

/// Connects with the SDK default credential chain, pinned to the
/// account's profile when it has one.
#[derive(Debug, Clone, Default)]
pub struct AwsIamConnector {
    /// Check via STS that credentials belong to the configured account
    pub verify_account: bool,
}

impl IamConnector for AwsIamConnector {
    type Client = IamClient;

    async fn connect(&self, ctx: &SlurpContext) -> Result<IamClient> {
        let aws = AwsContext::with_profile(&ctx.region, ctx.profile.as_deref()).await;
        if self.verify_account {
            verify_account(aws.sdk_config(), &ctx.account_number)
                .await
                .with_context(|| format!("Verifying account {}", ctx.account_name))?;
        }
        Ok(IamClient::from_context(&aws))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_iam::types::{AttachedPermissionsBoundary, PermissionsBoundaryAttachmentType};

    fn sdk_user(name: &str) -> aws_sdk_iam::types::builders::UserBuilder {
        User::builder()
            .user_name(name)
            .user_id("AIDAEXAMPLE")
            .arn(format!("arn:aws:iam::123456789012:user/{name}"))
            .path("/")
            .create_date(DateTime::from_secs(1_705_314_600))
    }

    #[test]
    fn test_base_record() {
        let record = base_record(&sdk_user("alice").build().unwrap());

        assert_eq!(record.user_name, "alice");
        assert_eq!(record.arn, "arn:aws:iam::123456789012:user/alice");
        assert_eq!(record.attribute("UserId"), Some(&json!("AIDAEXAMPLE")));
        assert_eq!(record.attribute("Path"), Some(&json!("/")));
        assert_eq!(
            record.attribute("CreateDate"),
            Some(&json!("2024-01-15T10:30:00+00:00"))
        );
        assert!(record.attribute("PasswordLastUsed").is_none());
        assert!(record.attribute("PermissionsBoundary").is_none());
    }

    #[test]
    fn test_base_record_optional_fields() {
        let boundary = AttachedPermissionsBoundary::builder()
            .permissions_boundary_arn("arn:aws:iam::aws:policy/PowerUserAccess")
            .permissions_boundary_type(PermissionsBoundaryAttachmentType::Policy)
            .build();
        let user = sdk_user("bob")
            .password_last_used(DateTime::from_secs(1_705_314_600))
            .permissions_boundary(boundary)
            .build()
            .unwrap();

        let record = base_record(&user);
        assert_eq!(
            record.attribute("PasswordLastUsed"),
            Some(&json!("2024-01-15T10:30:00+00:00"))
        );
        assert_eq!(
            record.attribute("PermissionsBoundary"),
            Some(&json!({
                "PermissionsBoundaryArn": "arn:aws:iam::aws:policy/PowerUserAccess",
                "PermissionsBoundaryType": "PermissionsBoundaryPolicy",
            }))
        );
    }

    #[test]
    fn test_apply_base_adds_get_user_details() {
        let mut record = base_record(&sdk_user("carol").build().unwrap())
            .with_attribute("Groups", json!(["developers"]));

        let boundary = AttachedPermissionsBoundary::builder()
            .permissions_boundary_arn("arn:aws:iam::aws:policy/ReadOnlyAccess")
            .permissions_boundary_type(PermissionsBoundaryAttachmentType::Policy)
            .build();
        let details = sdk_user("carol")
            .path("/engineering/")
            .permissions_boundary(boundary)
            .build()
            .unwrap();

        apply_base(&mut record, &details);

        assert_eq!(record.user_name, "carol");
        assert_eq!(record.attribute("Path"), Some(&json!("/engineering/")));
        assert_eq!(
            record.attribute("PermissionsBoundary"),
            Some(&json!({
                "PermissionsBoundaryArn": "arn:aws:iam::aws:policy/ReadOnlyAccess",
                "PermissionsBoundaryType": "PermissionsBoundaryPolicy",
            }))
        );
        assert_eq!(record.attribute("Groups"), Some(&json!(["developers"])));
    }

    #[test]
    fn test_apply_base_keeps_listed_password_last_used() {
        let listed = sdk_user("dave")
            .password_last_used(DateTime::from_secs(1_705_314_600))
            .build()
            .unwrap();
        let mut record = base_record(&listed);

        apply_base(&mut record, &sdk_user("dave").build().unwrap());

        assert_eq!(
            record.attribute("PasswordLastUsed"),
            Some(&json!("2024-01-15T10:30:00+00:00"))
        );
    }

    #[test]
    fn test_decode_policy_document() {
        let encoded = "%7B%22Version%22%3A%222012-10-17%22%2C%22Statement%22%3A%5B%5D%7D";
        assert_eq!(
            decode_policy_document(encoded).unwrap(),
            json!({"Version": "2012-10-17", "Statement": []})
        );
    }

    #[test]
    fn test_decode_plain_policy_document() {
        let doc = r#"{"Version":"2012-10-17"}"#;
        assert_eq!(
            decode_policy_document(doc).unwrap(),
            json!({"Version": "2012-10-17"})
        );
    }

    #[test]
    fn test_decode_invalid_policy_document() {
        assert!(decode_policy_document("%7Bnot-json").is_err());
    }

    #[test]
    fn test_json_helpers_accept_required_and_optional() {
        assert_eq!(json_str("x"), json!("x"));
        assert_eq!(json_str(None::<&str>), Value::Null);
        assert_eq!(json_status(&StatusType::Active), json!("Active"));
        assert_eq!(json_status(None::<&StatusType>), Value::Null);
        assert_eq!(json_date(&DateTime::from_secs(0)), json!("1970-01-01T00:00:00+00:00"));
        assert_eq!(json_date(None::<&DateTime>), Value::Null);
    }
}
