//! Command implementations over the local store.

use std::io::Write;

use anyhow::{Context, Result};
use keystate::{Cast, GetOptions, LocalState, StateValue, codec};

/// Turn command-line text into a value: JSON when it parses, text otherwise.
pub(crate) fn parse_value(text: &str) -> StateValue {
    serde_json::from_str::<serde_json::Value>(text)
        .map_or_else(|_| StateValue::from(text), StateValue::from)
}

/// Print a value: JSON pretty-printed, everything else as its stored text.
fn print_value(out: &mut impl Write, value: &StateValue) -> Result<()> {
    match value {
        StateValue::Json(json) => writeln!(out, "{}", serde_json::to_string_pretty(json)?)?,
        other => writeln!(out, "{}", codec::encode(other))?,
    }
    Ok(())
}

pub(crate) fn get(
    state: &LocalState,
    out: &mut impl Write,
    key: &str,
    cast: Option<Cast>,
    strict: bool,
    fallback: Option<&str>,
) -> Result<()> {
    let mut options = GetOptions::new();
    if let Some(cast) = cast {
        options = options.cast(cast);
    }
    if strict {
        options = options.strict();
    }
    if let Some(fallback) = fallback {
        options = options.fallback(parse_value(fallback));
    }

    if let Some(value) = state.get(key, options)? {
        print_value(out, &value)?;
    }
    Ok(())
}

pub(crate) fn set(state: &LocalState, key: &str, value: &str, json: bool) -> Result<()> {
    let value = if json {
        let parsed: serde_json::Value =
            serde_json::from_str(value).with_context(|| format!("value for {key} is not JSON"))?;
        StateValue::from(parsed)
    } else {
        StateValue::from(value)
    };
    state.set(key, value)?;
    Ok(())
}

pub(crate) fn remove(state: &LocalState, key: &str) -> Result<()> {
    state.remove(key)?;
    Ok(())
}

pub(crate) fn has(state: &LocalState, out: &mut impl Write, key: &str) -> Result<()> {
    writeln!(out, "{}", state.has(key)?)?;
    Ok(())
}

pub(crate) fn clear(state: &LocalState) -> Result<()> {
    state.clear()?;
    Ok(())
}

pub(crate) fn keys(state: &LocalState, out: &mut impl Write) -> Result<()> {
    for key in state.keys()? {
        writeln!(out, "{key}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystate::{StateError, open_local};
    use keystate_config::StateConfig;

    fn local() -> (LocalState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StateConfig::default();
        config.local.path = dir.path().join("local.json").display().to_string();
        (open_local(&config).unwrap(), dir)
    }

    fn output(run: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        run(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("25"), StateValue::Number(25.0));
        assert_eq!(parse_value("true"), StateValue::Boolean(true));
        assert_eq!(parse_value("dark"), StateValue::from("dark"));
        assert_eq!(parse_value("\"quoted\""), StateValue::from("quoted"));
    }

    #[test]
    fn test_set_and_get_plain() {
        let (state, _dir) = local();
        set(&state, "age", "25", false).unwrap();
        assert_eq!(
            output(|out| get(&state, out, "age", None, false, None)),
            "25\n"
        );
        assert_eq!(
            output(|out| get(&state, out, "age", Some(Cast::Boolean), false, None)),
            "true\n"
        );
    }

    #[test]
    fn test_set_json_pretty_prints() {
        let (state, _dir) = local();
        set(&state, "user", r#"{"id":1}"#, true).unwrap();
        assert_eq!(
            output(|out| get(&state, out, "user", None, false, None)),
            "{\n  \"id\": 1\n}\n"
        );
        assert!(set(&state, "bad", "{nope", true).is_err());
    }

    #[test]
    fn test_get_missing_with_fallback_and_strict() {
        let (state, _dir) = local();
        assert_eq!(
            output(|out| get(&state, out, "missing", None, false, None)),
            ""
        );
        assert_eq!(
            output(|out| get(&state, out, "missing", None, false, Some("7"))),
            "7\n"
        );

        let mut sink = Vec::new();
        let err = get(&state, &mut sink, "missing", None, true, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StateError>(),
            Some(StateError::NotFound { .. })
        ));
    }

    #[test]
    fn test_strict_cast_failure() {
        let (state, _dir) = local();
        set(&state, "id", "abc", false).unwrap();
        let mut sink = Vec::new();
        let err = get(&state, &mut sink, "id", Some(Cast::BigInt), true, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StateError>(),
            Some(StateError::InvalidCast { .. })
        ));
    }

    #[test]
    fn test_has_keys_remove_clear() {
        let (state, _dir) = local();
        set(&state, "b", "2", false).unwrap();
        set(&state, "a", "1", false).unwrap();
        assert_eq!(output(|out| keys(&state, out)), "a\nb\n");
        assert_eq!(output(|out| has(&state, out, "a")), "true\n");

        remove(&state, "a").unwrap();
        assert_eq!(output(|out| has(&state, out, "a")), "false\n");

        clear(&state).unwrap();
        assert_eq!(output(|out| keys(&state, out)), "");
    }
}
