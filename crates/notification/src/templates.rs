use serde_json::{json, Value};
use triage_core::{ClassificationEnvelope, EventKind};

use crate::format::{field, format_created_at, nested_field};

fn header(text: &str) -> Value {
    json!({"type": "header", "text": {"type": "plain_text", "text": text}})
}

fn section_text(markdown: String) -> Value {
    json!({"type": "section", "text": {"type": "mrkdwn", "text": markdown}})
}

fn section_fields(pairs: &[(&str, String)]) -> Value {
    let fields: Vec<Value> = pairs
        .iter()
        .map(|(label, value)| json!({"type": "mrkdwn", "text": format!("*{label}:* {value}")}))
        .collect();
    json!({"type": "section", "fields": fields})
}

fn spam_fields(envelope: &ClassificationEnvelope) -> Vec<(&'static str, String)> {
    vec![
        ("Spam Classification", envelope.prediction.label().to_string()),
        ("Spam Score", format!("{}", envelope.score)),
    ]
}

/// Renders the EventKind-specific Slack Block Kit message. Every
/// branch peeks only at the fields it needs and tolerates absent ones
/// as empty strings — the source payload is otherwise treated as
/// opaque.
pub fn render(kind: EventKind, envelope: &ClassificationEnvelope) -> Value {
    let data = &envelope.event_data;
    let blocks = if kind.is_user() {
        render_user(kind, data, envelope)
    } else if kind.is_issue() {
        render_issue(kind, data, envelope)
    } else if kind.is_issue_note() {
        render_issue_note(kind, data, envelope)
    } else if kind.is_group() {
        render_group(kind, data, envelope)
    } else if kind.is_project() {
        render_project(kind, data, envelope)
    } else {
        // snippet_check: no Block Kit layout defined by the original
        // templates; render a minimal fallback so delivery never panics.
        vec![section_text(format!(
            "*Snippet flagged*\n*Spam Classification:* {}\n*Spam Score*: {}",
            envelope.prediction.label(),
            envelope.score
        ))]
    };
    json!({"blocks": blocks})
}

fn render_user(kind: EventKind, data: &Value, envelope: &ClassificationEnvelope) -> Vec<Value> {
    let title = match kind {
        EventKind::UserCreate => "User Created on GitLab",
        EventKind::UserRename => "User Renamed on GitLab",
        _ => unreachable!(),
    };

    let mut blocks = vec![
        header(title),
        json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(
                    "*Username:* {}\n*Name:* {}\n*Email:* {}",
                    field(data, "username"),
                    field(data, "name"),
                    field(data, "email"),
                ),
            },
            "accessory": {
                "type": "image",
                "image_url": field(data, "avatar_url"),
                "alt_text": "avatar",
            }
        }),
        section_text(format!("*Spam Classification:* {}", envelope.prediction.label())),
        section_text(format!("*Spam Score*: {}", envelope.score)),
        section_text(format!(
            "*State:* {}\n*Web URL:* <{}|Profile>\n*Bio:* {}",
            field(data, "state"),
            field(data, "web_url"),
            field(data, "bio"),
        )),
    ];

    let website_url = field(data, "website_url");
    if !website_url.is_empty() {
        blocks.push(section_text(format!("*Website:* <{website_url}|Website>")));
    }

    blocks
}

fn render_issue(kind: EventKind, data: &Value, envelope: &ClassificationEnvelope) -> Vec<Value> {
    let title = match kind {
        EventKind::IssueOpen => "Issue Opened on GitLab",
        EventKind::IssueUpdate => "Issue Updated on GitLab",
        EventKind::IssueClose => "Issue Closed on GitLab",
        EventKind::IssueReopen => "Issue Reopened on GitLab",
        _ => unreachable!(),
    };

    let mut fields = vec![
        ("Title", field(data, "title")),
        ("Description", field(data, "description")),
        ("Author", nested_field(data, &["author", "name"])),
        ("State", field(data, "state")),
    ];
    fields.extend(spam_fields(envelope));

    vec![
        header(title),
        section_fields(&fields.iter().map(|(l, v)| (*l, v.clone())).collect::<Vec<_>>()),
        section_text(format!("*Link:* <{}|View Issue>", field(data, "web_url"))),
    ]
}

fn render_issue_note(kind: EventKind, data: &Value, envelope: &ClassificationEnvelope) -> Vec<Value> {
    let title = match kind {
        EventKind::IssueNoteCreate => "Issue Note Created on GitLab",
        EventKind::IssueNoteUpdate => "Issue Note Updated on GitLab",
        _ => unreachable!(),
    };

    let created_at = format_created_at(&field(data, "created_at"));
    let project_id = data
        .get("project_id")
        .map(|v| v.to_string())
        .unwrap_or_default();
    let mut fields = vec![
        ("Project ID", project_id),
        ("Issue IID", nested_field(data, &["issue", "iid"])),
        ("Author", nested_field(data, &["author", "name"])),
        ("Created At", created_at),
    ];
    fields.extend(spam_fields(envelope));

    vec![
        header(title),
        section_fields(&fields.iter().map(|(l, v)| (*l, v.clone())).collect::<Vec<_>>()),
        section_text(format!("*Content:*\n{}", field(data, "body"))),
        section_text(format!(
            "*Link:* <{}|View Author Profile>",
            nested_field(data, &["author", "web_url"])
        )),
    ]
}

fn render_group(kind: EventKind, data: &Value, envelope: &ClassificationEnvelope) -> Vec<Value> {
    let title = match kind {
        EventKind::GroupCreate => "Group Created on GitLab",
        EventKind::GroupRename => "Group Renamed on GitLab",
        _ => unreachable!(),
    };

    let created_at = format_created_at(&field(data, "created_at"));
    let mut fields = vec![
        ("Name", field(data, "name")),
        ("Visibility", field(data, "visibility")),
        ("Created At", created_at),
    ];
    fields.extend(spam_fields(envelope));

    vec![
        header(title),
        section_fields(&fields.iter().map(|(l, v)| (*l, v.clone())).collect::<Vec<_>>()),
        section_text(format!("*Link:* <{}|View Group>", field(data, "web_url"))),
    ]
}

fn render_project(kind: EventKind, data: &Value, envelope: &ClassificationEnvelope) -> Vec<Value> {
    let title = match kind {
        EventKind::ProjectCreate => "Project Created on GitLab",
        EventKind::ProjectRename => "Project Renamed on GitLab",
        EventKind::ProjectTransfer => "Project Ownership Transferred on GitLab",
        _ => unreachable!(),
    };

    let created_at = format_created_at(&field(data, "created_at"));
    let project_id = data
        .get("id")
        .map(|v| v.to_string())
        .unwrap_or_default();
    let mut fields = vec![
        ("Project ID", project_id),
        ("Project Name", field(data, "name")),
        ("Namespace", nested_field(data, &["namespace", "name"])),
        ("Created At", created_at),
    ];
    fields.extend(spam_fields(envelope));

    vec![
        header(title),
        section_fields(&fields.iter().map(|(l, v)| (*l, v.clone())).collect::<Vec<_>>()),
        section_text(format!("*Link:* <{}|View Project>", field(data, "web_url"))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_create_header_and_spam_fields_match_scenario_6() {
        let envelope = ClassificationEnvelope::scored(json!({"id": 7, "name": "A"}), 1, 0.8734);
        let rendered = render(EventKind::UserCreate, &envelope);
        let text = rendered.to_string();
        assert!(text.contains("User Created on GitLab"));
        assert!(text.contains("*Spam Classification:* Spam"));
        assert!(text.contains("*Spam Score*: 0.873"));
    }

    #[test]
    fn user_without_website_url_omits_the_website_block() {
        let envelope = ClassificationEnvelope::scored(json!({"username": "a"}), 0, 0.1);
        let rendered = render(EventKind::UserCreate, &envelope);
        assert!(!rendered.to_string().contains("Website"));
    }

    #[test]
    fn issue_note_links_to_author_profile_not_the_note() {
        let data = json!({
            "project_id": 1,
            "issue": {"iid": 2},
            "author": {"name": "bob", "web_url": "https://example.com/bob"},
            "created_at": "2024-01-01T00:00:00.000000Z",
            "body": "spam body",
        });
        let envelope = ClassificationEnvelope::scored(data, 1, 0.9);
        let rendered = render(EventKind::IssueNoteCreate, &envelope);
        let text = rendered.to_string();
        assert!(text.contains("https://example.com/bob"));
        assert!(text.contains("spam body"));
        assert!(text.contains("*Project ID:* 1"));
    }

    #[test]
    fn project_transfer_header_differs_from_create_and_rename() {
        let envelope = ClassificationEnvelope::scored(json!({}), 0, 0.0);
        let rendered = render(EventKind::ProjectTransfer, &envelope);
        assert!(rendered.to_string().contains("Project Ownership Transferred on GitLab"));
    }
}
