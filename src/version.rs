/// Release builds stamp `KNOTE_BUILD_VERSION`; local builds fall back to the
/// crate version.
pub const VERSION: &str = match option_env!("KNOTE_BUILD_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// `User-Agent` sent to the object store.
pub fn user_agent() -> String {
    format!("knote/{VERSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_names_the_build() {
        assert_eq!(user_agent(), format!("knote/{VERSION}"));
        assert!(!VERSION.is_empty());
    }
}
