//! Playwright locators
//!
//! Targets are described declaratively (role, visible text, test id, ...) and
//! rendered into Playwright locator expressions when a scenario script is
//! generated. Every user-supplied string is emitted as a JSON string literal.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How an element is found on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Locator {
    /// Visible text, substring and case-insensitive unless `exact`
    Text {
        text: String,
        #[serde(default)]
        exact: bool,
    },

    /// ARIA role with an optional accessible name
    Role {
        role: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        exact: bool,
    },

    /// `data-testid` attribute
    TestId { id: String },

    /// Associated `<label>` text
    Label { text: String },

    /// Input placeholder text
    Placeholder { text: String },

    /// Raw CSS selector
    Css { selector: String },
}

/// Which match to use when a locator resolves to several elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pick {
    /// Zero-based position
    Index(usize),
    Edge(Edge),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    First,
    Last,
}

/// A locator plus an optional pick among its matches.
///
/// Without a pick Playwright runs in strict mode: the locator must resolve to
/// exactly one element when acted upon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(flatten)]
    pub locator: Locator,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pick: Option<Pick>,
}

impl Target {
    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text { text: text.into(), exact: false }.into()
    }

    pub fn exact_text(text: impl Into<String>) -> Self {
        Locator::Text { text: text.into(), exact: true }.into()
    }

    pub fn role(role: impl Into<String>) -> Self {
        Locator::Role { role: role.into(), name: None, exact: false }.into()
    }

    /// Shorthand for `getByRole('button', { name })`
    pub fn button(name: impl Into<String>) -> Self {
        Locator::Role {
            role: "button".to_string(),
            name: Some(name.into()),
            exact: false,
        }
        .into()
    }

    pub fn test_id(id: impl Into<String>) -> Self {
        Locator::TestId { id: id.into() }.into()
    }

    pub fn label(text: impl Into<String>) -> Self {
        Locator::Label { text: text.into() }.into()
    }

    pub fn placeholder(text: impl Into<String>) -> Self {
        Locator::Placeholder { text: text.into() }.into()
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css { selector: selector.into() }.into()
    }

    pub fn first(mut self) -> Self {
        self.pick = Some(Pick::Edge(Edge::First));
        self
    }

    pub fn last(mut self) -> Self {
        self.pick = Some(Pick::Edge(Edge::Last));
        self
    }

    pub fn nth(mut self, index: usize) -> Self {
        self.pick = Some(Pick::Index(index));
        self
    }

    /// Render as a Playwright locator expression rooted at `page`
    pub fn to_js(&self, page: &str) -> String {
        let base = match &self.locator {
            Locator::Text { text, exact } => {
                if *exact {
                    format!("{}.getByText({}, {{ exact: true }})", page, js_str(text))
                } else {
                    format!("{}.getByText({})", page, js_str(text))
                }
            }
            Locator::Role { role, name, exact } => match name {
                Some(name) if *exact => format!(
                    "{}.getByRole({}, {{ name: {}, exact: true }})",
                    page,
                    js_str(role),
                    js_str(name)
                ),
                Some(name) => format!(
                    "{}.getByRole({}, {{ name: {} }})",
                    page,
                    js_str(role),
                    js_str(name)
                ),
                None => format!("{}.getByRole({})", page, js_str(role)),
            },
            Locator::TestId { id } => format!("{}.getByTestId({})", page, js_str(id)),
            Locator::Label { text } => format!("{}.getByLabel({})", page, js_str(text)),
            Locator::Placeholder { text } => {
                format!("{}.getByPlaceholder({})", page, js_str(text))
            }
            Locator::Css { selector } => format!("{}.locator({})", page, js_str(selector)),
        };

        match self.pick {
            None => base,
            Some(Pick::Edge(Edge::First)) => format!("{}.first()", base),
            Some(Pick::Edge(Edge::Last)) => format!("{}.last()", base),
            Some(Pick::Index(i)) => format!("{}.nth({})", base, i),
        }
    }
}

impl From<Locator> for Target {
    fn from(locator: Locator) -> Self {
        Self { locator, pick: None }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.locator {
            Locator::Text { text, .. } => write!(f, "text={:?}", text)?,
            Locator::Role { role, name: Some(name), .. } => {
                write!(f, "role={}[name={:?}]", role, name)?
            }
            Locator::Role { role, name: None, .. } => write!(f, "role={}", role)?,
            Locator::TestId { id } => write!(f, "testid={}", id)?,
            Locator::Label { text } => write!(f, "label={:?}", text)?,
            Locator::Placeholder { text } => write!(f, "placeholder={:?}", text)?,
            Locator::Css { selector } => write!(f, "css={}", selector)?,
        }
        match self.pick {
            None => Ok(()),
            Some(Pick::Edge(Edge::First)) => write!(f, "#first"),
            Some(Pick::Edge(Edge::Last)) => write!(f, "#last"),
            Some(Pick::Index(i)) => write!(f, "#{}", i),
        }
    }
}

/// Quote a string as a JavaScript string literal
pub fn js_str(value: &str) -> String {
    // JSON strings are valid JS literals; serializing a str cannot fail
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
