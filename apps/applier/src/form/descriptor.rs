use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Textarea,
    Dropdown,
    CustomDropdown,
    RadioGroup,
    Checkbox,
    FileUpload,
}

impl FieldKind {
    /// Fill order within one form step.
    pub const FILL_ORDER: [FieldKind; 7] = [
        FieldKind::RadioGroup,
        FieldKind::Text,
        FieldKind::Textarea,
        FieldKind::Dropdown,
        FieldKind::CustomDropdown,
        FieldKind::FileUpload,
        FieldKind::Checkbox,
    ];

    pub fn is_free_text(self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::Textarea)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Text => "input",
            FieldKind::Textarea => "textarea",
            FieldKind::Dropdown => "dropdown",
            FieldKind::CustomDropdown => "custom dropdown",
            FieldKind::RadioGroup => "radio",
            FieldKind::Checkbox => "checkbox",
            FieldKind::FileUpload => "file upload",
        };
        f.write_str(name)
    }
}

/// One visible form control at scan time. Produced fresh on every scan and
/// matched across scans by label text only; `handle` is valid for the scan
/// that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub handle: String,
    pub label: String,
    pub kind: FieldKind,
    /// Raw `type` attribute for inputs (`text`, `email`, `tel`, `number`).
    #[serde(default)]
    pub input_type: String,
    #[serde(default)]
    pub current_value: String,
    #[serde(default)]
    pub required: bool,
    /// Radio labels or rendered dropdown options, in document order.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub checked: bool,
}

impl FieldDescriptor {
    pub fn new(handle: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            handle: handle.into(),
            label: label.into(),
            kind,
            input_type: match kind {
                FieldKind::Text => "text".to_string(),
                _ => String::new(),
            },
            current_value: String::new(),
            required: false,
            options: Vec::new(),
            checked: false,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.current_value = value.into();
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = input_type.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    pub fn has_value(&self) -> bool {
        !self.current_value.trim().is_empty()
    }

    /// Inputs the numeric repair pass may rewrite.
    pub fn accepts_numeric_repair(&self) -> bool {
        self.kind == FieldKind::Text && matches!(self.input_type.as_str(), "text" | "number")
    }

    /// A dropdown still showing its placeholder (`""`, "Select an option").
    pub fn holds_placeholder(&self) -> bool {
        if !matches!(self.kind, FieldKind::Dropdown | FieldKind::CustomDropdown) {
            return false;
        }
        let value = self.current_value.trim().to_lowercase();
        value.is_empty() || value.starts_with("select")
    }
}

/// What to do to a control.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldAction {
    /// Clear and type.
    Type(String),
    /// Pick the option at `index` (text kept for logs and label-based drivers).
    Select { index: usize, text: String },
    Check,
    Upload(PathBuf),
}

impl fmt::Display for FieldAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldAction::Type(v) => write!(f, "type '{v}'"),
            FieldAction::Select { index, text } => write!(f, "select #{index} '{text}'"),
            FieldAction::Check => f.write_str("check"),
            FieldAction::Upload(path) => write!(f, "upload {}", path.display()),
        }
    }
}
