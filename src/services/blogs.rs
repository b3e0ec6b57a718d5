use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ServiceError,
    models::{BlogResponse, NewBlogRecord, NewBlogRequest, UpdateBlogRequest},
    repository::RepositoryState,
};

/// BlogService
///
/// Creation validation, ownership assignment and delete authorization for blogs.
#[derive(Clone)]
pub struct BlogService {
    repo: RepositoryState,
}

impl BlogService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// Every blog, each with its owner populated (id, username, name).
    pub async fn list(&self) -> Result<Vec<BlogResponse>, ServiceError> {
        let blogs = self.repo.list_blogs().await?;
        Ok(blogs.into_iter().map(BlogResponse::from).collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<BlogResponse, ServiceError> {
        self.repo
            .get_blog(id)
            .await?
            .map(BlogResponse::from)
            .ok_or(ServiceError::NotFound("blog"))
    }

    /// create
    ///
    /// Requires an acting user, checked before the payload so an anonymous caller
    /// always gets `Unauthenticated`. `likes` defaults to 0.
    ///
    /// The blog insert and the append to the owner's `blogs` list are two separate
    /// writes. If the second one fails the blog stays stored without a back-reference
    /// and the error is returned to the caller.
    #[instrument(skip(self, input, acting_user), fields(user_id = ?acting_user.map(|u| u.id)))]
    pub async fn create(
        &self,
        input: NewBlogRequest,
        acting_user: Option<&AuthUser>,
    ) -> Result<BlogResponse, ServiceError> {
        let user = acting_user.ok_or(ServiceError::Unauthenticated("token missing or invalid"))?;
        let record = validate_new_blog(input, user.id)?;

        let blog = self.repo.insert_blog(record).await?;

        match self.repo.append_user_blog(user.id, blog.id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!(blog_id = %blog.id, "owner vanished before blog could be linked");
            }
            Err(e) => {
                tracing::error!(blog_id = %blog.id, "blog stored but not linked to owner: {}", e);
                return Err(e.into());
            }
        }

        tracing::info!(blog_id = %blog.id, "blog created");
        Ok(BlogResponse::from(blog))
    }

    /// update
    ///
    /// Replaces each provided field. Any caller may update any blog: unlike
    /// `delete`, there is no ownership check here.
    pub async fn update(
        &self,
        id: Uuid,
        patch: UpdateBlogRequest,
    ) -> Result<BlogResponse, ServiceError> {
        validate_blog_patch(&patch)?;
        self.repo
            .update_blog(id, patch)
            .await?
            .map(BlogResponse::from)
            .ok_or(ServiceError::NotFound("blog"))
    }

    /// delete
    ///
    /// Owner only. A blog without a recorded owner cannot be deleted by anyone.
    #[instrument(skip(self, acting_user), fields(user_id = ?acting_user.map(|u| u.id)))]
    pub async fn delete(&self, id: Uuid, acting_user: Option<&AuthUser>) -> Result<(), ServiceError> {
        let user = acting_user.ok_or(ServiceError::Unauthenticated("token missing or invalid"))?;

        let found = self
            .repo
            .get_blog_with_owner(id)
            .await?
            .ok_or(ServiceError::NotFound("blog"))?;

        match found.owner {
            Some(owner) if owner.id == user.id => {}
            _ => return Err(ServiceError::Forbidden),
        }

        if self.repo.delete_blog(id).await? {
            tracing::info!(blog_id = %id, "blog deleted");
            Ok(())
        } else {
            // Removed concurrently between the lookup and the delete.
            Err(ServiceError::NotFound("blog"))
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Fields left out of a patch keep their stored value, but a provided title,
/// author or url must still be non-blank.
fn validate_blog_patch(patch: &UpdateBlogRequest) -> Result<(), ServiceError> {
    let blank: Vec<&str> = [
        ("title", &patch.title),
        ("author", &patch.author),
        ("url", &patch.url),
    ]
    .into_iter()
    .filter(|(_, value)| value.as_deref().is_some_and(is_blank))
    .map(|(name, _)| name)
    .collect();

    if !blank.is_empty() {
        return Err(ServiceError::Validation(format!(
            "required fields must not be empty: {}",
            blank.join(", ")
        )));
    }
    if patch.likes.is_some_and(|likes| likes < 0) {
        return Err(ServiceError::Validation(
            "likes must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Collects every missing required field into one validation message.
fn validate_new_blog(input: NewBlogRequest, user_id: Uuid) -> Result<NewBlogRecord, ServiceError> {
    fn present(value: Option<String>) -> Option<String> {
        value.filter(|v| !is_blank(v))
    }

    let title = present(input.title);
    let author = present(input.author);
    let url = present(input.url);

    let missing: Vec<&str> = [("title", &title), ("author", &author), ("url", &url)]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect();

    let likes = input.likes.unwrap_or(0);

    match (title, author, url) {
        (Some(title), Some(author), Some(url)) => {
            if likes < 0 {
                return Err(ServiceError::Validation(
                    "likes must not be negative".to_string(),
                ));
            }
            Ok(NewBlogRecord {
                title,
                author,
                url,
                likes,
                user_id: Some(user_id),
            })
        }
        _ => Err(ServiceError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        ))),
    }
}
