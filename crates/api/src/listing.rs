// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use shift_exchange_domain::{DomainError, OperationTypes, TenantId};
use std::str::FromStr;

use crate::error::ApiError;
use crate::gateway::{DirectoryUser, REPLACEMENT_ROLE, UserDirectory};

/// Resolves the status names of a listing filter.
///
/// Unknown names are rejected. An empty list resolves to `active`.
pub(crate) fn resolve_statuses<S>(
    requested: &[String],
    active: &[S],
    as_str: fn(&S) -> &'static str,
) -> Result<Vec<&'static str>, ApiError>
where
    S: FromStr<Err = DomainError>,
{
    if requested.is_empty() {
        return Ok(active.iter().map(as_str).collect());
    }

    requested
        .iter()
        .map(|raw| {
            S::from_str(raw.trim())
                .map(|status| as_str(&status))
                .map_err(ApiError::from)
        })
        .collect()
}

/// Decides which offers a viewer may see.
///
/// Offers restricted to replacement are shown to their owner and to
/// members holding the replacement role. Without a viewer every offer is
/// visible.
pub(crate) struct Visibility {
    viewer: Option<String>,
    sees_replacements: bool,
}

impl Visibility {
    pub(crate) fn for_viewer(
        directory: &dyn UserDirectory,
        tenant: &TenantId,
        viewer: Option<&str>,
    ) -> Result<Self, ApiError> {
        let Some(viewer) = viewer else {
            return Ok(Self {
                viewer: None,
                sees_replacements: true,
            });
        };

        let user: Option<DirectoryUser> = directory.get_by_id(tenant, viewer)?;
        Ok(Self {
            viewer: Some(viewer.to_string()),
            sees_replacements: user.is_some_and(|u| u.has_role(REPLACEMENT_ROLE)),
        })
    }

    pub(crate) fn can_see(&self, owner_user_id: &str, operation_types: &OperationTypes) -> bool {
        self.sees_replacements
            || !operation_types.is_replacement_only()
            || self.viewer.as_deref() == Some(owner_user_id)
    }
}
