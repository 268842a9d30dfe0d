use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Page object returned by the wiki backend.
///
/// Realtime payloads carry the same shape but usually without `revision.body`,
/// so everything except the ids is optional on the wire.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Page {
    #[serde(rename = "_id", default)]
    pub id: String,

    pub path: String,

    pub revision: Revision,

    #[serde(rename = "revisionHackmdSynced", default)]
    pub revision_hackmd_synced: Option<String>,

    #[serde(rename = "hasDraftOnHackmd", default)]
    pub has_draft_on_hackmd: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Revision {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default)]
    pub body: String,

    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct UserRef {
    pub name: String,
}

/// `(page_id, path)`. `page_id` is absent until the page is first created.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PageIdentity {
    pub page_id: Option<String>,
    pub path: String,
}

impl PageIdentity {
    #[cfg(test)]
    pub fn is_created(&self) -> bool {
        self.page_id.is_some()
    }
}

/// `created_at` is kept as the server sent it: epoch millis from the page
/// markup, an ISO timestamp from save responses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct RevisionRef {
    pub revision_id: String,
    pub created_at: Option<String>,
}

/// A revision reference plus the revision the collaborative editor last consumed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SyncedRevisionRef {
    pub revision: Option<RevisionRef>,
    pub revision_id_hackmd_synced: Option<String>,
}

/// Which editor surface is authoritative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub(crate) enum EditorMode {
    #[strum(serialize = "builtin")]
    Primary,
    #[strum(serialize = "hackmd")]
    External,
}

impl EditorMode {
    /// `#edit` opens the primary editor, `#hackmd` the collaborative one.
    pub fn from_location_hash(hash: &str) -> Option<Self> {
        match hash.trim_start_matches('#') {
            "edit" => Some(Self::Primary),
            "hackmd" => Some(Self::External),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub(crate) enum Grant {
    #[default]
    Public,
    Restricted,
    Specified,
    Owner,
    UserGroup,
}

impl From<Grant> for u8 {
    fn from(g: Grant) -> Self {
        match g {
            Grant::Public => 1,
            Grant::Restricted => 2,
            Grant::Specified => 3,
            Grant::Owner => 4,
            Grant::UserGroup => 5,
        }
    }
}

impl TryFrom<u8> for Grant {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::Public),
            2 => Ok(Self::Restricted),
            3 => Ok(Self::Specified),
            4 => Ok(Self::Owner),
            5 => Ok(Self::UserGroup),
            other => Err(format!("unknown grant: {other}")),
        }
    }
}

/// Options merged into the create/update request body.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SaveOptions {
    pub grant: Grant,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_user_group_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_user_group_name: Option<String>,

    pub is_slack_enabled: bool,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub slack_channels: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_client_id: Option<String>,

    #[serde(default)]
    pub is_sync_revision_to_hackmd: bool,

    #[serde(default)]
    pub overwrite_scopes_of_descendants: bool,
}

/// Caller input of a submit-button save.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SubmitOptions {
    pub overwrite_scopes_of_descendants: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_contract_deserialize() {
        let json = r##"{
            "_id": "p1",
            "path": "/Sandbox",
            "revision": {"_id": "r2", "body": "# Hello", "createdAt": "2024-01-01T00:00:00.000Z"},
            "revisionHackmdSynced": "r1",
            "hasDraftOnHackmd": true
        }"##;
        let page: Page = serde_json::from_str(json).expect("page should parse");
        assert_eq!(page.id, "p1");
        assert_eq!(page.revision.id, "r2");
        assert_eq!(page.revision.body, "# Hello");
        assert_eq!(page.revision_hackmd_synced.as_deref(), Some("r1"));
        assert!(page.has_draft_on_hackmd);
    }

    #[test]
    fn test_realtime_page_without_body_deserializes() {
        let json = r#"{"path": "/a", "revision": {"_id": "r9"}, "revisionHackmdSynced": null}"#;
        let page: Page = serde_json::from_str(json).expect("partial page should parse");
        assert!(page.id.is_empty());
        assert!(page.revision.body.is_empty());
        assert!(page.revision_hackmd_synced.is_none());
        assert!(!page.has_draft_on_hackmd);
    }

    #[test]
    fn test_save_options_serialize_camel_case() {
        let opts = SaveOptions {
            grant: Grant::UserGroup,
            grant_user_group_id: Some("g1".to_string()),
            socket_client_id: Some("abc".to_string()),
            is_sync_revision_to_hackmd: true,
            ..Default::default()
        };
        let v = serde_json::to_value(opts).expect("should serialize");
        assert_eq!(v["grant"], 5);
        assert_eq!(v["grantUserGroupId"], "g1");
        assert_eq!(v["socketClientId"], "abc");
        assert_eq!(v["isSyncRevisionToHackmd"], true);
        assert_eq!(v["overwriteScopesOfDescendants"], false);
        assert!(v.get("slackChannels").is_none());
        assert!(v.get("grantUserGroupName").is_none());
    }

    #[test]
    fn test_grant_rejects_unknown_value() {
        assert!(Grant::try_from(9).is_err());
        assert_eq!(Grant::try_from(4), Ok(Grant::Owner));
    }

    #[test]
    fn test_editor_mode_from_location_hash() {
        assert_eq!(EditorMode::from_location_hash("#edit"), Some(EditorMode::Primary));
        assert_eq!(EditorMode::from_location_hash("#hackmd"), Some(EditorMode::External));
        assert_eq!(EditorMode::from_location_hash(""), None);
        assert_eq!(EditorMode::from_location_hash("#revision-history"), None);
    }

    #[test]
    fn test_editor_mode_names() {
        assert_eq!(EditorMode::Primary.to_string(), "builtin");
        let m: &'static str = EditorMode::External.into();
        assert_eq!(m, "hackmd");
    }
}
