//! Built-in verification flows
//!
//! Selector notes: role-engine selectors quote the accessible name for exact
//! matching, and quoted text selectors are exact-match, which keeps
//! `text="Connected"` from matching the chat widget's "Disconnected" state.

use serde::Serialize;

use crate::scenario::{AttributeAssertion, Cookie, Scenario, Step, Viewport, WaitState, WaitUntil};

/// User record seeded into the `auth-user` cookie for authenticated flows.
///
/// Field names must match what the storefront reads out of the cookie, so
/// the wire shape is camelCase with nested role records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub roles: Vec<RoleBinding>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleBinding {
    pub role: RoleName,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleName {
    pub name: String,
}

/// The fixed user the chat flow authenticates as
pub fn seeded_user() -> AuthUser {
    AuthUser {
        id: "test-user-id-123".into(),
        name: "Test User".into(),
        first_name: "Test".into(),
        last_name: "User".into(),
        email: "test@example.com".into(),
        roles: vec![RoleBinding { role: RoleName { name: "USER".into() } }],
    }
}

/// All built-in flows, in execution order
pub fn all() -> Vec<Scenario> {
    vec![buy_now(), chat(), top_bar()]
}

/// Look up a built-in flow by name
pub fn by_name(name: &str) -> Option<Scenario> {
    all().into_iter().find(|f| f.name == name)
}

/// Checkout path: homepage, first product card, Buy Now, checkout URL
pub fn buy_now() -> Scenario {
    Scenario {
        name: "buy-now".into(),
        description: "Buy Now from the first product card lands on checkout".into(),
        viewport: Viewport::default(),
        cookies: vec![],
        steps: vec![
            Step::Navigate {
                path: "/".into(),
                wait_until: WaitUntil::Load,
                timeout_ms: None,
            },
            Step::Click {
                selector: ".product-card a".into(),
                timeout_ms: None,
            },
            Step::Wait {
                selector: "text=Add to Cart".into(),
                state: WaitState::Visible,
                timeout_ms: None,
            },
            Step::Click {
                selector: r#"role=button[name="Buy Now"]"#.into(),
                timeout_ms: None,
            },
            Step::WaitForUrl {
                pattern: "**/checkout**".into(),
                timeout_ms: None,
            },
            Step::Screenshot { name: "verification".into() },
        ],
    }
}

/// Authenticated dashboard chat: seeded cookie, welcome heading, chat widget
pub fn chat() -> Scenario {
    Scenario {
        name: "chat".into(),
        description: "Authenticated user opens the admin chat widget".into(),
        viewport: Viewport::default(),
        cookies: vec![Cookie {
            name: "auth-user".into(),
            value: serde_json::to_string(&seeded_user()).unwrap_or_default(),
            domain: "localhost".into(),
            path: "/".into(),
        }],
        steps: vec![
            Step::Navigate {
                path: "/dashboard".into(),
                wait_until: WaitUntil::NetworkIdle,
                timeout_ms: None,
            },
            Step::Wait {
                selector: r#"role=heading[name="Welcome back, Test User!"]"#.into(),
                state: WaitState::Visible,
                timeout_ms: Some(10_000),
            },
            Step::Assert {
                selector: r#"role=button[name="Chat"]"#.into(),
                visible: Some(true),
                attribute: None,
                timeout_ms: None,
            },
            Step::Click {
                selector: r#"role=button[name="Chat"]"#.into(),
                timeout_ms: None,
            },
            Step::Assert {
                selector: r#"role=heading[name="Chat with Admin"]"#.into(),
                visible: Some(true),
                attribute: None,
                timeout_ms: None,
            },
            Step::Assert {
                selector: r#"[placeholder="Type a message..."]"#.into(),
                visible: Some(true),
                attribute: None,
                timeout_ms: None,
            },
            // The widget renders a Connected/Disconnected status span; wait on
            // it rather than sleeping through the chat connection setup.
            Step::Wait {
                selector: r#"text="Connected""#.into(),
                state: WaitState::Visible,
                timeout_ms: Some(10_000),
            },
            Step::Screenshot { name: "chat-window".into() },
        ],
    }
}

/// Header navigation: Shop hidden, Categories links to the products page
pub fn top_bar() -> Scenario {
    Scenario {
        name: "top-bar".into(),
        description: "Header shows Categories instead of Shop and links to /products".into(),
        viewport: Viewport::default(),
        cookies: vec![],
        steps: vec![
            Step::Navigate {
                path: "/".into(),
                wait_until: WaitUntil::Load,
                timeout_ms: None,
            },
            Step::Assert {
                selector: r#"header >> role=link[name="Shop"]"#.into(),
                visible: Some(false),
                attribute: None,
                timeout_ms: None,
            },
            Step::Assert {
                selector: r#"header >> role=link[name="Categories"]"#.into(),
                visible: Some(true),
                attribute: Some(AttributeAssertion {
                    name: "href".into(),
                    value: "/products".into(),
                }),
                timeout_ms: None,
            },
            Step::Screenshot { name: "homepage_verification".into() },
            Step::Click {
                selector: r#"header >> role=link[name="Categories"]"#.into(),
                timeout_ms: None,
            },
            Step::AssertUrl {
                path: "/products".into(),
                timeout_ms: None,
            },
            Step::Assert {
                selector: r#"role=heading[name="Products"]"#.into(),
                visible: Some(true),
                attribute: None,
                timeout_ms: None,
            },
            Step::Screenshot { name: "products_page_verification".into() },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("buy-now"; "buy now")]
    #[test_case("chat"; "chat")]
    #[test_case("top-bar"; "top bar")]
    fn test_by_name_finds_builtin(name: &str) {
        let flow = by_name(name).expect("flow should exist");
        assert_eq!(flow.name, name);
        assert!(!flow.steps.is_empty());
    }

    #[test]
    fn test_by_name_rejects_unknown() {
        assert!(by_name("wishlist").is_none());
    }

    #[test]
    fn test_flows_cover_expected_artifacts() {
        let names: Vec<String> = all()
            .iter()
            .flat_map(|f| f.screenshot_names().into_iter().map(String::from).collect::<Vec<_>>())
            .collect();
        assert_eq!(
            names,
            vec![
                "verification",
                "chat-window",
                "homepage_verification",
                "products_page_verification",
            ]
        );
    }

    #[test]
    fn test_chat_cookie_payload() {
        let flow = chat();
        assert_eq!(flow.cookies.len(), 1);
        let cookie = &flow.cookies[0];
        assert_eq!(cookie.name, "auth-user");
        assert_eq!(cookie.domain, "localhost");
        assert_eq!(cookie.path, "/");

        let user: serde_json::Value = serde_json::from_str(&cookie.value).unwrap();
        assert_eq!(user["id"], "test-user-id-123");
        assert_eq!(user["name"], "Test User");
        assert_eq!(user["firstName"], "Test");
        assert_eq!(user["lastName"], "User");
        assert_eq!(user["email"], "test@example.com");
        assert_eq!(user["roles"][0]["role"]["name"], "USER");
    }

    #[test]
    fn test_buy_now_fails_at_product_card_when_no_products() {
        // The product-card click is the second step; with zero cards it is
        // the first step that can time out, before any Buy Now interaction.
        let flow = buy_now();
        assert!(flow.steps[0].is_navigation());
        assert_eq!(flow.steps[1].name(), "click:.product-card a");
    }

    #[test]
    fn test_only_chat_seeds_cookies() {
        assert!(buy_now().cookies.is_empty());
        assert!(top_bar().cookies.is_empty());
        assert!(!chat().cookies.is_empty());
    }
}
