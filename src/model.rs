use std::collections::BTreeMap;
use std::str::FromStr;

use rustc_serialize::json::{Json, ToJson};

use crate::error::StoreError;

/// A blog post. `title` and `content` keep whatever JSON value the client
/// sent, so a post created with `{"title": 7, ...}` is echoed back unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    id: u64,
    title: Json,
    content: Json,
}

impl Post {
    pub fn new(id: u64, title: &str, content: &str) -> Post {
        Post::with_values(id, Json::String(title.to_string()), Json::String(content.to_string()))
    }

    pub fn with_values(id: u64, title: Json, content: Json) -> Post {
        Post { id, title, content }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    #[cfg(test)]
    pub fn title(&self) -> Option<&str> {
        self.title.as_string()
    }

    /// Overwrite whichever fields were sent with a non-null value.
    pub fn apply(&mut self, fields: PostFields) {
        if let Some(title) = fields.title.filter(|value| !value.is_null()) {
            self.title = title;
        }
        if let Some(content) = fields.content.filter(|value| !value.is_null()) {
            self.content = content;
        }
    }

    fn matches(&self, needle: &str) -> bool {
        text(&self.title).to_lowercase().contains(needle) || text(&self.content).to_lowercase().contains(needle)
    }

    fn sort_key(&self, field: SortField) -> SortKey {
        match field {
            SortField::Id => SortKey::Number(self.id),
            SortField::Title => SortKey::Text(text(&self.title).trim().to_lowercase()),
            SortField::Content => SortKey::Text(text(&self.content).trim().to_lowercase()),
        }
    }
}

/// Strings as they are, anything else as its JSON encoding.
fn text(value: &Json) -> String {
    match *value {
        Json::String(ref s) => s.clone(),
        ref other => other.to_string(),
    }
}

impl ToJson for Post {
    fn to_json(&self) -> Json {
        let mut object = BTreeMap::new();
        object.insert("id".to_string(), Json::U64(self.id));
        object.insert("title".to_string(), self.title.clone());
        object.insert("content".to_string(), self.content.clone());
        Json::Object(object)
    }
}

/// The `title`/`content` pair sent by a client. `None` means the key was
/// missing from the request body; a key sent as `null` is `Some(Json::Null)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostFields {
    pub title: Option<Json>,
    pub content: Option<Json>,
}

impl PostFields {
    #[cfg(test)]
    pub fn new(title: &str, content: &str) -> PostFields {
        PostFields {
            title: Some(Json::String(title.to_string())),
            content: Some(Json::String(content.to_string())),
        }
    }

    pub fn from_json(payload: &str) -> Result<PostFields, StoreError> {
        let json = Json::from_str(payload).map_err(|_| StoreError::Validation)?;
        let object = json.as_object().ok_or(StoreError::Validation)?;

        Ok(PostFields {
            title: object.get("title").cloned(),
            content: object.get("content").cloned(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
    Content,
}

impl FromStr for SortField {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<SortField, StoreError> {
        match s {
            "id" => Ok(SortField::Id),
            "title" => Ok(SortField::Title),
            "content" => Ok(SortField::Content),
            other => Err(StoreError::InvalidField(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<SortDirection, StoreError> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(StoreError::InvalidDirection(other.to_string())),
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Number(u64),
    Text(String),
}

/// Lower-case `term` once so it can be matched against many posts.
pub fn matcher(term: &str) -> impl Fn(&Post) -> bool {
    let needle = term.to_lowercase();
    move |post| post.matches(&needle)
}

/// Compare two posts on `field` in the given direction.
pub fn compare(field: SortField, direction: SortDirection) -> impl Fn(&Post, &Post) -> std::cmp::Ordering {
    move |a, b| {
        let ordering = a.sort_key(field).cmp(&b.sort_key(field));
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tells_missing_keys_from_null_ones() {
        let fields = PostFields::from_json(r#"{"title": "Date", "content": null}"#).unwrap();
        assert_eq!(fields.title, Some(Json::String("Date".to_string())));
        assert_eq!(fields.content, Some(Json::Null));

        let fields = PostFields::from_json(r#"{"content": 7}"#).unwrap();
        assert_eq!(fields.title, None);
        assert_eq!(fields.content, Some(Json::U64(7)));
    }

    #[test]
    fn rejects_bodies_that_are_not_objects() {
        assert_eq!(PostFields::from_json("not json"), Err(StoreError::Validation));
        assert_eq!(PostFields::from_json("[1, 2]"), Err(StoreError::Validation));
        assert_eq!(PostFields::from_json("null"), Err(StoreError::Validation));
    }

    #[test]
    fn null_fields_leave_the_post_alone() {
        let mut post = Post::new(1, "Banana", "Yellow fruit.");
        post.apply(PostFields::from_json(r#"{"title": null, "content": "Ripe."}"#).unwrap());
        assert_eq!(post, Post::new(1, "Banana", "Ripe."));
    }

    #[test]
    fn encodes_post_with_sorted_keys() {
        let post = Post::new(4, "Date", "Sweet");
        assert_eq!(post.to_json().to_string(), r#"{"content":"Sweet","id":4,"title":"Date"}"#);

        let post = Post::with_values(5, Json::U64(7), Json::Null);
        assert_eq!(post.to_json().to_string(), r#"{"content":null,"id":5,"title":7}"#);
    }

    #[test]
    fn parses_sort_parameters() {
        assert_eq!("id".parse::<SortField>(), Ok(SortField::Id));
        assert_eq!("desc".parse::<SortDirection>(), Ok(SortDirection::Desc));
        assert_eq!("author".parse::<SortField>(), Err(StoreError::InvalidField("author".to_string())));
        assert_eq!("up".parse::<SortDirection>(), Err(StoreError::InvalidDirection("up".to_string())));
    }

    #[test]
    fn text_keys_ignore_case_and_surrounding_whitespace() {
        let cmp = compare(SortField::Title, SortDirection::Asc);
        let a = Post::new(1, "  apple ", "");
        let b = Post::new(2, "Apple", "");
        assert_eq!(cmp(&a, &b), std::cmp::Ordering::Equal);
    }

    #[test]
    fn non_string_values_match_on_their_encoding() {
        let post = Post::with_values(1, Json::U64(747), Json::Null);
        assert!(matcher("74")(&post));
        assert!(matcher("NULL")(&post));
        assert!(!matcher("banana")(&post));
    }
}
