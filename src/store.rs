use crate::error::{Result, StoreError};
use crate::model::{self, Post, PostFields, SortDirection, SortField};

#[derive(Clone, Debug, Default)]
pub struct PostStore {
    posts: Vec<Post>,
}

impl PostStore {
    /// The posts every fresh process starts with.
    pub fn seeded() -> PostStore {
        PostStore {
            posts: vec![
                Post::new(1, "Banana", "Yellow fruit."),
                Post::new(2, "Apple", "Keeps the doctor away."),
                Post::new(3, "Cherry", "Small red fruit."),
            ],
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Append a post built from `fields`. Both keys must have been sent; their
    /// values are kept as they are, `null` included. Ids are always one past
    /// the current maximum, so an emptied store starts again at 1.
    pub fn create(&mut self, fields: PostFields) -> Result<Post> {
        let (title, content) = match (fields.title, fields.content) {
            (Some(title), Some(content)) => (title, content),
            _ => return Err(StoreError::Validation),
        };

        let id = self.posts.iter().map(Post::id).max().unwrap_or(0) + 1;
        let post = Post::with_values(id, title, content);
        self.posts.push(post.clone());
        Ok(post)
    }

    pub fn find(&self, id: u64) -> Option<&Post> {
        self.posts.iter().find(|post| post.id() == id)
    }

    pub fn delete(&mut self, id: u64) -> Result<()> {
        let index = self
            .posts
            .iter()
            .position(|post| post.id() == id)
            .ok_or(StoreError::NotFound(id))?;
        self.posts.remove(index);
        Ok(())
    }

    /// Update a post in place and hand back the whole collection.
    pub fn update(&mut self, id: u64, fields: PostFields) -> Result<&[Post]> {
        let post = self
            .posts
            .iter_mut()
            .find(|post| post.id() == id)
            .ok_or(StoreError::NotFound(id))?;
        post.apply(fields);
        Ok(&self.posts)
    }

    pub fn search(&self, term: &str) -> Vec<Post> {
        let matches = model::matcher(term);
        self.posts.iter().filter(|post| matches(*post)).cloned().collect()
    }

    /// A sorted copy of the posts; the store keeps its insertion order.
    pub fn sorted(&self, field: &str, direction: &str) -> Result<Vec<Post>> {
        let field: SortField = field.parse()?;
        let direction: SortDirection = direction.parse()?;

        let mut posts = self.posts.clone();
        posts.sort_by(model::compare(field, direction));
        Ok(posts)
    }
}
