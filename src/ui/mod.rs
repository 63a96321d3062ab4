//! Presentation layer. Commands build the view models below and hand them to
//! a [`Presenter`]; nothing else in the crate writes to the terminal.

mod terminal;

use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

use crate::format::StateMarker;

pub use terminal::{TerminalOptions, TerminalPresenter};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListItem {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accessories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<StateMarker>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListSection {
    pub title: String,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListView {
    pub title: String,
    pub sections: Vec<ListSection>,
    /// Shown when every section is empty.
    pub empty_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl ListView {
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.items.is_empty())
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataEntry {
    pub label: String,
    pub value: String,
}

/// A follow-up the user can run, e.g. a `gh` command to copy.
#[derive(Debug, Clone, Serialize)]
pub struct ActionHint {
    pub title: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DetailView {
    pub title: String,
    pub markdown: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionHint>,
}

impl DetailView {
    pub fn new(title: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            markdown: markdown.into(),
            ..Self::default()
        }
    }

    pub fn meta(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push(MetadataEntry {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    pub fn action(mut self, title: impl Into<String>, value: impl Into<String>) -> Self {
        self.actions.push(ActionHint {
            title: title.into(),
            value: value.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Multi-line input, composed in the editor.
    TextArea,
    Checkbox,
    Dropdown(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub id: &'static str,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Pre-filled value, usually from a command-line flag.
    pub value: Option<String>,
    pub placeholder: Option<String>,
    /// Help shown below the text when the value is composed in an editor.
    pub instructions: Vec<String>,
}

impl FormField {
    pub fn new(id: &'static str, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id,
            label: label.into(),
            kind,
            required: false,
            value: None,
            placeholder: None,
            instructions: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn instructions(mut self, instructions: Vec<String>) -> Self {
        self.instructions = instructions;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Form {
    pub title: String,
    pub fields: Vec<FormField>,
}

impl Form {
    pub fn new(title: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self {
            title: title.into(),
            fields,
        }
    }

    /// Every required field must hold a non-blank value.
    pub fn validate(&self, values: &FormValues) -> std::result::Result<(), String> {
        let missing: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required && values.get(f.id).map_or(true, |v| v.trim().is_empty()))
            .map(|f| f.label.as_str())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("Required: {}", missing.join(", ")))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(BTreeMap<String, String>);

impl FormValues {
    pub fn insert(&mut self, id: &str, value: impl Into<String>) {
        self.0.insert(id.to_string(), value.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    /// Trimmed, non-blank text value.
    pub fn text(&self, id: &str) -> Option<&str> {
        self.get(id).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn flag(&self, id: &str) -> bool {
        matches!(self.get(id), Some("true" | "yes" | "y" | "1"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeStyle {
    Animated,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub style: NoticeStyle,
    pub title: String,
    pub message: Option<String>,
}

impl Notice {
    pub fn progress(title: impl Into<String>) -> Self {
        Self {
            style: NoticeStyle::Animated,
            title: title.into(),
            message: None,
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self {
            style: NoticeStyle::Success,
            title: title.into(),
            message: None,
        }
    }

    pub fn failure(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            style: NoticeStyle::Failure,
            title: title.into(),
            message: Some(message.into()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Entering a nested view.
    Push(String),
    Pop,
    OpenUrl(String),
}

/// Capabilities a front end offers to commands.
pub trait Presenter {
    fn render_list(&mut self, view: &ListView) -> Result<()>;

    fn render_detail(&mut self, view: &DetailView) -> Result<()>;

    /// Unstyled output meant for piping: exported diffs, digests, records.
    fn render_text(&mut self, text: &str) -> Result<()>;

    /// Collect values for `form`. `Ok(None)` means the user cancelled.
    fn render_form(&mut self, form: &Form) -> Result<Option<FormValues>>;

    fn notify(&mut self, notice: &Notice);

    fn navigate(&mut self, navigation: Navigation);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> Form {
        Form::new(
            "Send Message",
            vec![
                FormField::new("prompt", "Message", FieldKind::TextArea).required(),
                FormField::new("title", "Title", FieldKind::Text),
            ],
        )
    }

    #[test]
    fn test_validate_required_fields() {
        let form = form();
        let mut values = FormValues::default();
        assert_eq!(form.validate(&values), Err("Required: Message".to_string()));

        values.insert("prompt", "   ");
        assert!(form.validate(&values).is_err());

        values.insert("prompt", "hello");
        assert!(form.validate(&values).is_ok());
    }

    #[test]
    fn test_form_values_accessors() {
        let mut values = FormValues::default();
        values.insert("name", "  spaced  ");
        values.insert("auto_pr", "true");
        values.insert("blank", " ");
        assert_eq!(values.text("name"), Some("spaced"));
        assert_eq!(values.text("blank"), None);
        assert!(values.flag("auto_pr"));
        assert!(!values.flag("name"));
        assert!(!values.flag("missing"));
    }

    #[test]
    fn test_list_view_counts() {
        let view = ListView {
            sections: vec![
                ListSection::default(),
                ListSection {
                    title: "Today".to_string(),
                    items: vec![ListItem::default(), ListItem::default()],
                },
            ],
            ..ListView::default()
        };
        assert!(!view.is_empty());
        assert_eq!(view.item_count(), 2);
        assert!(ListView::default().is_empty());
    }

    #[test]
    fn test_detail_builder_serializes_compactly() {
        let view = DetailView::new("Session", "body").meta("State", "Completed");
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["metadata"][0]["label"], "State");
        assert!(json.get("actions").is_none());
    }
}
