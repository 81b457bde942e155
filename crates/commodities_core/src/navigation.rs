//! crates/commodities_core/src/navigation.rs
//!
//! The application's route table and the role-driven navigation built on it.

use crate::auth::AuthSnapshot;
use crate::domain::Role;
use crate::guard::{LOGIN_PATH, UNAUTHORIZED_PATH};

/// Where the login page sends the user when no `redirect` was requested.
pub const DEFAULT_AFTER_LOGIN: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Unauthorized,
    Dashboard,
    Products,
}

impl Route {
    pub const ALL: [Route; 4] = [
        Route::Login,
        Route::Unauthorized,
        Route::Dashboard,
        Route::Products,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => LOGIN_PATH,
            Route::Unauthorized => UNAUTHORIZED_PATH,
            Route::Dashboard => "/dashboard",
            Route::Products => "/products",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.path() == path)
    }

    /// Public routes are reachable without signing in.
    pub fn is_public(self) -> bool {
        matches!(self, Route::Login | Route::Unauthorized)
    }

    pub fn required_roles(self) -> &'static [Role] {
        match self {
            Route::Login | Route::Unauthorized => &[],
            Route::Dashboard => &[Role::Manager],
            Route::Products => &[Role::Manager, Role::StoreKeeper],
        }
    }
}

/// A sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub route: Route,
}

const MENU: [MenuItem; 2] = [
    MenuItem {
        label: "Dashboard",
        route: Route::Dashboard,
    },
    MenuItem {
        label: "Products",
        route: Route::Products,
    },
];

/// The entries a role may see, in menu order.
pub fn menu_for(role: Role) -> Vec<MenuItem> {
    MENU.into_iter()
        .filter(|item| item.route.required_roles().contains(&role))
        .collect()
}

/// Where `/` sends the user. `None` while the gate is still hydrating.
pub fn home_destination(snapshot: &AuthSnapshot) -> Option<Route> {
    if snapshot.is_loading {
        return None;
    }
    if !snapshot.is_authenticated() {
        return Some(Route::Login);
    }
    if snapshot.has_role(Role::Manager) {
        Some(Route::Dashboard)
    } else {
        Some(Route::Products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;

    fn snapshot(is_loading: bool, role: Option<Role>) -> AuthSnapshot {
        AuthSnapshot {
            is_loading,
            access_token: role.map(|_| "tok".to_string()),
            user: role.map(|role| User {
                id: "u".to_string(),
                email: "e@x.com".to_string(),
                role,
            }),
        }
    }

    #[test]
    fn manager_sees_dashboard_and_products() {
        let labels: Vec<_> = menu_for(Role::Manager).iter().map(|m| m.label).collect();
        assert_eq!(labels, ["Dashboard", "Products"]);
    }

    #[test]
    fn store_keeper_sees_products_only() {
        let routes: Vec<_> = menu_for(Role::StoreKeeper).iter().map(|m| m.route).collect();
        assert_eq!(routes, [Route::Products]);
    }

    #[test]
    fn home_redirects_by_role() {
        assert_eq!(home_destination(&snapshot(true, Some(Role::Manager))), None);
        assert_eq!(home_destination(&snapshot(false, None)), Some(Route::Login));
        assert_eq!(
            home_destination(&snapshot(false, Some(Role::Manager))),
            Some(Route::Dashboard)
        );
        assert_eq!(
            home_destination(&snapshot(false, Some(Role::StoreKeeper))),
            Some(Route::Products)
        );
    }

    #[test]
    fn route_paths_round_trip() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("/nowhere"), None);
        assert!(Route::Login.is_public());
        assert!(!Route::Dashboard.is_public());
    }
}
