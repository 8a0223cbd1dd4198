//! Identifier case conversion.
//!
//! Condition family names arrive in whatever shape the caller or an older
//! stored blob used (`post_type`, `post-type`, `PostType`). Everything is
//! normalized to `snake_case` before it is matched against a [`Family`].
//! Manager names go through the same path to become storage keys.
//!
//! [`Family`]: crate::conditions::Family

use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

/// Host option names are capped at 191 characters; keys stay below that.
pub const MAX_STORAGE_KEY_LEN: usize = 190;

/// Room left for the `_notices` suffix on application keys.
const MAX_APP_NAME_LEN: usize = 180;

pub fn snake(thing: &str) -> String {
    thing.trim().to_snake_case()
}

pub fn kebab(thing: &str) -> String {
    thing.trim().to_kebab_case()
}

pub fn pascal(thing: &str) -> String {
    thing.trim().to_upper_camel_case()
}

pub fn camel(thing: &str) -> String {
    thing.trim().to_lower_camel_case()
}

/// Truncates to at most `max` characters, never splitting a code point.
pub fn limit(thing: &str, max: usize) -> String {
    thing.chars().take(max).collect()
}

/// Storage key for a named manager.
pub fn storage_key(name: &str) -> String {
    limit(&snake(name), MAX_STORAGE_KEY_LEN)
}

/// Storage key for an application's default manager, e.g. `my_app_notices`.
pub fn app_storage_key(app_name: &str) -> String {
    format!("{}_notices", limit(&snake(app_name), MAX_APP_NAME_LEN))
}
