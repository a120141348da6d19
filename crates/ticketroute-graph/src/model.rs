//! Graph wire types.
//!
//! Only the properties this crate reads or writes are modelled; everything
//! else in Graph responses is ignored.

use serde::{Deserialize, Serialize};
use ticketroute_core::{MailFolder, MessageRef, MessageRule, RuleDraft};

/// A collection response page.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    /// Link to the next page, if any.
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// `mailFolder` resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphFolder {
    /// Folder id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Parent folder id.
    #[serde(default)]
    pub parent_folder_id: Option<String>,
}

impl From<GraphFolder> for MailFolder {
    fn from(folder: GraphFolder) -> Self {
        Self {
            id: folder.id,
            display_name: folder.display_name.unwrap_or_default(),
            parent_id: folder.parent_folder_id,
        }
    }
}

/// Body for creating a folder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFolder<'a> {
    /// Display name of the new folder.
    pub display_name: &'a str,
}

/// `messageRulePredicates` resource (subset).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePredicates {
    /// Subject substrings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_contains: Option<Vec<String>>,
}

/// `messageRuleActions` resource (subset).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleActions {
    /// Destination folder id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_to_folder: Option<String>,
    /// Whether later rules are skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_processing_rules: Option<bool>,
}

/// `messageRule` resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRule {
    /// Rule id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Whether the rule is enabled.
    #[serde(default)]
    pub is_enabled: Option<bool>,
    /// Conditions.
    #[serde(default)]
    pub conditions: Option<RulePredicates>,
    /// Actions.
    #[serde(default)]
    pub actions: Option<RuleActions>,
}

impl From<GraphRule> for MessageRule {
    fn from(rule: GraphRule) -> Self {
        let conditions = rule.conditions.unwrap_or_default();
        let actions = rule.actions.unwrap_or_default();
        Self {
            id: rule.id,
            display_name: rule.display_name.unwrap_or_default(),
            enabled: rule.is_enabled.unwrap_or(false),
            subject_contains: conditions.subject_contains.unwrap_or_default(),
            move_to_folder: actions.move_to_folder,
            stop_processing_rules: actions.stop_processing_rules.unwrap_or(false),
        }
    }
}

/// Full rule body for create and replace.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBody {
    /// Display name.
    pub display_name: String,
    /// Whether the rule is enabled.
    pub is_enabled: bool,
    /// Conditions.
    pub conditions: RulePredicates,
    /// Actions.
    pub actions: RuleActions,
}

impl From<&RuleDraft> for RuleBody {
    fn from(draft: &RuleDraft) -> Self {
        Self {
            display_name: draft.display_name.clone(),
            is_enabled: draft.enabled,
            conditions: RulePredicates {
                subject_contains: Some(draft.subject_contains.clone()),
            },
            actions: RuleActions {
                move_to_folder: Some(draft.move_to_folder.clone()),
                stop_processing_rules: Some(draft.stop_processing_rules),
            },
        }
    }
}

/// Patch body that touches only the enabled flag.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleStatePatch {
    /// New enabled flag.
    pub is_enabled: bool,
}

/// Body of a message move or copy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination<'a> {
    /// Destination folder id.
    pub destination_id: &'a str,
}

/// `message` resource, id only.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphMessage {
    /// Message id.
    pub id: String,
}

impl From<GraphMessage> for MessageRef {
    fn from(message: GraphMessage) -> Self {
        Self { id: message.id }
    }
}

/// Error envelope returned by Graph on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    /// Error detail.
    pub error: ErrorBody,
}

/// Graph error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    /// Error code.
    #[serde(default)]
    pub code: String,
    /// Error message.
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_folder_page() {
        let page: Page<GraphFolder> = serde_json::from_value(json!({
            "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users('x')/mailFolders",
            "value": [
                {"id": "AAMk1", "displayName": "Inbox", "parentFolderId": "AAMk0", "totalItemCount": 3}
            ],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/me/mailFolders?$skip=10"
        }))
        .unwrap();
        assert!(page.next_link.is_some());
        let folder = MailFolder::from(page.value.into_iter().next().unwrap());
        assert_eq!(folder.display_name, "Inbox");
        assert_eq!(folder.parent_id.as_deref(), Some("AAMk0"));
    }

    #[test]
    fn test_rule_body_shape() {
        let draft = RuleDraft {
            display_name: "TKT-123456789012345".into(),
            enabled: true,
            subject_contains: vec!["TrackingID#123456789012345".into()],
            move_to_folder: "AAMkFolder".into(),
            stop_processing_rules: true,
        };
        let body = serde_json::to_value(RuleBody::from(&draft)).unwrap();
        assert_eq!(
            body,
            json!({
                "displayName": "TKT-123456789012345",
                "isEnabled": true,
                "conditions": {"subjectContains": ["TrackingID#123456789012345"]},
                "actions": {"moveToFolder": "AAMkFolder", "stopProcessingRules": true}
            })
        );
    }

    #[test]
    fn test_state_patch_only_has_flag() {
        let body = serde_json::to_value(RuleStatePatch { is_enabled: false }).unwrap();
        assert_eq!(body, json!({"isEnabled": false}));
    }

    #[test]
    fn test_rule_with_missing_sections() {
        let rule: GraphRule = serde_json::from_value(json!({
            "id": "AQAAAJ5dZqA=",
            "displayName": "TKT-1",
            "isEnabled": true
        }))
        .unwrap();
        let rule = MessageRule::from(rule);
        assert!(rule.enabled);
        assert!(rule.subject_contains.is_empty());
        assert!(rule.move_to_folder.is_none());
    }

    #[test]
    fn test_destination_body() {
        let body = serde_json::to_value(Destination {
            destination_id: "AAMkDest",
        })
        .unwrap();
        assert_eq!(body, json!({"destinationId": "AAMkDest"}));
    }
}
