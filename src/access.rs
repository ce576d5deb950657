use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Role, User};

/// Who is making the request, as resolved by the request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub role: Role,
}

impl From<&User> for RequestContext {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
        }
    }
}

pub const STAFF: &[Role] = &[Role::Faculty, Role::Admin];

pub fn has_role(ctx: &RequestContext, allowed: &[Role]) -> bool {
    allowed.contains(&ctx.role)
}

pub fn require_role(ctx: &RequestContext, allowed: &[Role]) -> Result<()> {
    if has_role(ctx, allowed) {
        Ok(())
    } else {
        Err(Error::Forbidden { role: ctx.role })
    }
}
