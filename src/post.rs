//! Post structs: caller input and the canonical record sent to the server.

use crate::encoding::{RawText, normalize_text};
use crate::error::{MetaWeblogError, Result};
use crate::value::Value;

/// Default `post_type` when the caller does not set one.
pub const DEFAULT_POST_TYPE: &str = "post";

/// Default for `mt_allow_comments` and `mt_allow_pings`.
pub const DEFAULT_DISCUSSION_STATUS: &str = "open";

/// A blog post as described by the caller.
///
/// `title` and `description` are required by construction. Everything else
/// is optional and filled in from the MetaWeblog field defaults when the post
/// is turned into a [`CanonicalPost`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PostStruct {
    /// Post title
    pub title: RawText,
    /// Post body
    pub description: RawText,
    /// Post type, e.g. `post` or `page`
    pub post_type: Option<Value>,
    /// Extended entry text ("read more" section)
    pub mt_text_more: Option<RawText>,
    /// Category names
    pub categories: Option<Vec<RawText>>,
    /// Tags
    pub mt_keywords: Option<Vec<RawText>>,
    /// Excerpt
    pub mt_excerpt: Option<RawText>,
    /// `open` / `closed`, or whatever the server accepts (WordPress takes
    /// `0` / `1` too)
    pub mt_allow_comments: Option<Value>,
    /// Same values as `mt_allow_comments`
    pub mt_allow_pings: Option<Value>,
    /// Media enclosure, passed through as-is
    pub enclosure: Option<Value>,
}

impl PostStruct {
    /// Creates a post with the two required fields.
    pub fn new(title: impl Into<RawText>, description: impl Into<RawText>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Sets the post type.
    pub fn post_type(mut self, post_type: impl Into<Value>) -> Self {
        self.post_type = Some(post_type.into());
        self
    }

    /// Sets the extended entry text.
    pub fn text_more(mut self, text: impl Into<RawText>) -> Self {
        self.mt_text_more = Some(text.into());
        self
    }

    /// Sets the categories.
    pub fn categories<I, T>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RawText>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the keywords (tags).
    pub fn keywords<I, T>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RawText>,
    {
        self.mt_keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the excerpt.
    pub fn excerpt(mut self, excerpt: impl Into<RawText>) -> Self {
        self.mt_excerpt = Some(excerpt.into());
        self
    }

    /// Sets the comment status.
    pub fn allow_comments(mut self, status: impl Into<Value>) -> Self {
        self.mt_allow_comments = Some(status.into());
        self
    }

    /// Sets the ping status.
    pub fn allow_pings(mut self, status: impl Into<Value>) -> Self {
        self.mt_allow_pings = Some(status.into());
        self
    }

    /// Attaches an enclosure struct.
    pub fn enclosure(mut self, enclosure: Value) -> Self {
        self.enclosure = Some(enclosure);
        self
    }

    /// Reads a post from a loosely-typed struct value.
    ///
    /// Fails with [`MetaWeblogError::InvalidStruct`] when `title` or
    /// `description` is missing, or when a text field holds something other
    /// than a string or number. Numbers are taken as their decimal text.
    /// `categories` and `mt_keywords` that are not arrays are ignored.
    /// `post_type`, the discussion flags and `enclosure` are kept as given.
    pub fn from_value(value: &Value) -> Result<Self> {
        let title = required_text(value, "title")?;
        let description = required_text(value, "description")?;

        let member = |key: &str| value.get(key).filter(|v| !v.is_nil());
        let text = |key: &str| member(key).map(|v| scalar_text(v, key)).transpose();
        let list = |key: &str| -> Result<Option<Vec<RawText>>> {
            member(key)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| scalar_text(item, &format!("{key}[{i}]")))
                        .collect::<Result<Vec<_>>>()
                })
                .transpose()
        };

        Ok(Self {
            title,
            description,
            post_type: member("post_type").cloned(),
            mt_text_more: text("mt_text_more")?,
            categories: list("categories")?,
            mt_keywords: list("mt_keywords")?,
            mt_excerpt: text("mt_excerpt")?,
            mt_allow_comments: member("mt_allow_comments").cloned(),
            mt_allow_pings: member("mt_allow_pings").cloned(),
            enclosure: member("enclosure").cloned(),
        })
    }
}

impl TryFrom<&Value> for PostStruct {
    type Error = MetaWeblogError;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_value(value)
    }
}

fn required_text(value: &Value, key: &str) -> Result<RawText> {
    match value.get(key) {
        Some(Value::Nil) | None => Err(MetaWeblogError::invalid_struct(key)),
        Some(member) => scalar_text(member, key),
    }
}

fn scalar_text(value: &Value, key: &str) -> Result<RawText> {
    match value {
        Value::String(s) => Ok(RawText::from(s.as_str())),
        Value::Int(i) => Ok(RawText::from(i.to_string())),
        Value::Double(d) => Ok(RawText::from(d.to_string())),
        other => Err(MetaWeblogError::invalid_struct_type(key, other.type_name())),
    }
}

/// A field that may be absent. Absent text is sent as boolean `false`.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionalText {
    Absent,
    Text(String),
}

impl From<OptionalText> for Value {
    fn from(t: OptionalText) -> Self {
        match t {
            OptionalText::Absent => Value::Bool(false),
            OptionalText::Text(s) => Value::String(s),
        }
    }
}

/// A fully defaulted and normalized post, ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalPost {
    pub title: String,
    pub description: String,
    pub post_type: Value,
    pub mt_text_more: OptionalText,
    pub categories: Vec<String>,
    pub mt_keywords: Vec<String>,
    pub mt_excerpt: OptionalText,
    pub mt_allow_comments: Value,
    pub mt_allow_pings: Value,
    pub enclosure: Option<Value>,
}

impl CanonicalPost {
    /// Applies the field defaults and normalizes the free-text fields.
    ///
    /// Structural fields (`post_type`, the discussion flags, `enclosure`) are
    /// enumerations or opaque structs for the server and pass through verbatim.
    pub fn build(post: &PostStruct, encoding: &str) -> Result<Self> {
        let text = |raw: &RawText| normalize_text(raw.as_bytes(), encoding);
        let optional = |raw: &Option<RawText>| -> Result<OptionalText> {
            raw.as_ref()
                .map_or(Ok(OptionalText::Absent), |t| text(t).map(OptionalText::Text))
        };
        let list = |raw: &Option<Vec<RawText>>| -> Result<Vec<String>> {
            raw.as_deref().unwrap_or_default().iter().map(text).collect()
        };

        Ok(Self {
            title: text(&post.title)?,
            description: text(&post.description)?,
            post_type: post
                .post_type
                .clone()
                .unwrap_or_else(|| Value::from(DEFAULT_POST_TYPE)),
            mt_text_more: optional(&post.mt_text_more)?,
            categories: list(&post.categories)?,
            mt_keywords: list(&post.mt_keywords)?,
            mt_excerpt: optional(&post.mt_excerpt)?,
            mt_allow_comments: post
                .mt_allow_comments
                .clone()
                .unwrap_or_else(|| Value::from(DEFAULT_DISCUSSION_STATUS)),
            mt_allow_pings: post
                .mt_allow_pings
                .clone()
                .unwrap_or_else(|| Value::from(DEFAULT_DISCUSSION_STATUS)),
            enclosure: post.enclosure.clone(),
        })
    }
}

impl From<CanonicalPost> for Value {
    fn from(post: CanonicalPost) -> Self {
        let mut members = vec![
            ("title".to_string(), Value::String(post.title)),
            ("description".to_string(), Value::String(post.description)),
            ("post_type".to_string(), post.post_type),
            ("mt_text_more".to_string(), post.mt_text_more.into()),
            ("categories".to_string(), Value::from(post.categories)),
            ("mt_keywords".to_string(), Value::from(post.mt_keywords)),
            ("mt_excerpt".to_string(), post.mt_excerpt.into()),
            ("mt_allow_comments".to_string(), post.mt_allow_comments),
            ("mt_allow_pings".to_string(), post.mt_allow_pings),
        ];

        if let Some(enclosure) = post.enclosure {
            members.push(("enclosure".to_string(), enclosure));
        }

        Value::Struct(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_post_gets_defaults() {
        let post = CanonicalPost::build(&PostStruct::new("T", "D"), "UTF-8").unwrap();

        assert_eq!(post.title, "T");
        assert_eq!(post.description, "D");
        assert_eq!(post.post_type, Value::from("post"));
        assert_eq!(post.mt_text_more, OptionalText::Absent);
        assert!(post.categories.is_empty());
        assert!(post.mt_keywords.is_empty());
        assert_eq!(post.mt_excerpt, OptionalText::Absent);
        assert_eq!(post.mt_allow_comments, Value::from("open"));
        assert_eq!(post.mt_allow_pings, Value::from("open"));
        assert!(post.enclosure.is_none());

        let value = Value::from(post);
        assert_eq!(value.get("mt_text_more"), Some(&Value::Bool(false)));
        assert_eq!(value.get("categories"), Some(&Value::Array(vec![])));
        assert!(value.get("enclosure").is_none());
    }

    #[test]
    fn test_free_text_is_normalized_and_flags_are_verbatim() {
        let post = PostStruct::new("Fish & Chips", "<p>tasty</p>")
            .post_type("page")
            .text_more("more & more")
            .excerpt("short")
            .categories(["Food & Drink", "UK"])
            .keywords(["<fish>", "chips"])
            .allow_comments("closed")
            .allow_pings("<raw>");

        let canonical = CanonicalPost::build(&post, "UTF-8").unwrap();
        assert_eq!(canonical.title, "Fish &amp; Chips");
        assert_eq!(canonical.description, "&lt;p&gt;tasty&lt;/p&gt;");
        assert_eq!(canonical.post_type, Value::from("page"));
        assert_eq!(
            canonical.mt_text_more,
            OptionalText::Text("more &amp; more".into())
        );
        assert_eq!(canonical.categories, ["Food &amp; Drink", "UK"]);
        assert_eq!(canonical.mt_keywords, ["&lt;fish&gt;", "chips"]);
        assert_eq!(canonical.mt_excerpt, OptionalText::Text("short".into()));
        assert_eq!(canonical.mt_allow_comments, Value::from("closed"));
        assert_eq!(canonical.mt_allow_pings, Value::from("<raw>"));
    }

    #[test]
    fn test_enclosure_passes_through() {
        let enclosure = Value::structure([
            ("url", Value::from("http://blog.example/a&b.mp3")),
            ("length", Value::Int(1024)),
            ("type", Value::from("audio/mpeg")),
        ]);
        let post = PostStruct::new("T", "D").enclosure(enclosure.clone());

        let value = Value::from(CanonicalPost::build(&post, "UTF-8").unwrap());
        assert_eq!(value.get("enclosure"), Some(&enclosure));
    }

    #[test]
    fn test_field_order_on_the_wire() {
        let value = Value::from(CanonicalPost::build(&PostStruct::new("T", "D"), "UTF-8").unwrap());
        let Value::Struct(members) = value else {
            panic!("Expected struct");
        };
        let keys: Vec<_> = members.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            [
                "title",
                "description",
                "post_type",
                "mt_text_more",
                "categories",
                "mt_keywords",
                "mt_excerpt",
                "mt_allow_comments",
                "mt_allow_pings",
            ]
        );
    }

    #[test]
    fn test_from_value_requires_title_and_description() {
        let no_title = Value::structure([("description", Value::from("D"))]);
        let err = PostStruct::from_value(&no_title).unwrap_err();
        assert_eq!(err, MetaWeblogError::invalid_struct("title"));

        let no_description = Value::structure([("title", Value::from("T"))]);
        let err = PostStruct::try_from(&no_description).unwrap_err();
        assert_eq!(err, MetaWeblogError::invalid_struct("description"));

        let err = PostStruct::from_value(&Value::from("not a struct")).unwrap_err();
        assert!(matches!(err, MetaWeblogError::InvalidStruct { .. }));
    }

    #[test]
    fn test_from_value_ignores_non_array_lists() {
        let value = Value::structure([
            ("title", Value::from("T")),
            ("description", Value::from("D")),
            ("categories", Value::from("news")),
            ("mt_keywords", Value::from(vec!["a", "b"])),
            ("mt_allow_pings", Value::from("closed")),
        ]);

        let post = PostStruct::from_value(&value).unwrap();
        assert!(post.categories.is_none());
        assert_eq!(
            post.mt_keywords,
            Some(vec![RawText::from("a"), RawText::from("b")])
        );
        assert_eq!(post.mt_allow_pings, Some(Value::from("closed")));

        let canonical = CanonicalPost::build(&post, "UTF-8").unwrap();
        assert!(canonical.categories.is_empty());
        assert_eq!(canonical.mt_keywords, ["a", "b"]);
    }

    #[test]
    fn test_from_value_keeps_structural_fields_as_given() {
        let value = Value::structure([
            ("title", Value::from("T")),
            ("description", Value::from("D")),
            ("post_type", Value::from("page")),
            ("mt_allow_comments", Value::Int(0)),
            ("mt_allow_pings", Value::Bool(false)),
        ]);

        let post = PostStruct::from_value(&value).unwrap();
        let sent = Value::from(CanonicalPost::build(&post, "UTF-8").unwrap());

        assert_eq!(sent.get("post_type"), Some(&Value::from("page")));
        assert_eq!(sent.get("mt_allow_comments"), Some(&Value::Int(0)));
        assert_eq!(sent.get("mt_allow_pings"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_from_value_keeps_every_list_element() {
        let value = Value::structure([
            ("title", Value::from("T")),
            ("description", Value::from("D")),
            (
                "categories",
                Value::Array(vec![Value::from("a"), Value::Int(5), Value::from("b")]),
            ),
            ("mt_excerpt", Value::Double(1.5)),
        ]);

        let post = PostStruct::from_value(&value).unwrap();
        let canonical = CanonicalPost::build(&post, "UTF-8").unwrap();

        assert_eq!(canonical.categories, ["a", "5", "b"]);
        assert_eq!(canonical.mt_excerpt, OptionalText::Text("1.5".into()));
    }

    #[test]
    fn test_from_value_rejects_unconvertible_text() {
        let value = Value::structure([
            ("title", Value::from("T")),
            ("description", Value::from("D")),
            (
                "mt_keywords",
                Value::Array(vec![Value::from("a"), Value::structure([("x", Value::Int(1))])]),
            ),
        ]);
        let err = PostStruct::from_value(&value).unwrap_err();
        assert_eq!(
            err,
            MetaWeblogError::invalid_struct_type("mt_keywords[1]", "struct")
        );

        let value = Value::structure([("title", Value::Bool(true)), ("description", Value::from("D"))]);
        let err = PostStruct::from_value(&value).unwrap_err();
        assert_eq!(err, MetaWeblogError::invalid_struct_type("title", "boolean"));
    }

    #[test]
    fn test_encoding_failure_propagates() {
        let post = PostStruct::new("日本", "D");
        let err = CanonicalPost::build(&post, "ISO-8859-1").unwrap_err();
        assert!(matches!(err, MetaWeblogError::Encoding { .. }));
    }
}
