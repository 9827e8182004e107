use crate::error::AppError;
use crate::models::{Collection, Document, Filter, Role};
use crate::traits::DocumentStore;

/// Look up the role stored on the user with `email`.
///
/// Returns `None` for unknown users and for roles outside [`Role`].
pub async fn stored_role<S: DocumentStore>(
    store: &S,
    email: &str,
) -> Result<Option<Role>, AppError> {
    let user = store
        .find_one(Collection::Users, &Filter::all().eq("email", email))
        .await?;

    Ok(user
        .and_then(|u| u.body.get_str("role").map(str::to_string))
        .and_then(|role| role.parse().ok()))
}

/// Fail with [`AppError::Forbidden`] unless `email` belongs to an admin.
pub async fn ensure_admin<S: DocumentStore>(store: &S, email: &str) -> Result<(), AppError> {
    match stored_role(store, email).await? {
        Some(Role::Admin) => Ok(()),
        _ => {
            tracing::warn!(%email, "Admin access denied");
            Err(AppError::Forbidden("admin role required".into()))
        }
    }
}

/// Validate the `role` a user submits for their own record.
///
/// A stored admin keeps the role: resubmitting `admin` is dropped from the
/// patch and any other role is refused. Nobody else may claim `admin`.
pub fn check_role_patch(stored: Option<Role>, patch: &mut Document) -> Result<(), AppError> {
    let Some(requested) = patch.get("role") else {
        return Ok(());
    };
    let requested = requested.as_str().and_then(|r| r.parse::<Role>().ok());

    match (stored, requested) {
        (Some(Role::Admin), Some(Role::Admin)) => {
            patch.remove("role");
            Ok(())
        }
        (Some(Role::Admin), _) => Err(AppError::Forbidden(
            "an admin's role can only be changed by an operator".into(),
        )),
        (_, Some(Role::Admin)) => Err(AppError::Forbidden(
            "the admin role cannot be self-assigned".into(),
        )),
        _ => Ok(()),
    }
}
