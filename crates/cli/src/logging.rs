//! Tracing subscriber setup.
//!
//! Filtering follows `RUST_LOG` (default `info`). Setting `LOG_FORMAT=json`
//! switches to one JSON object per line. Output goes to stderr.

use tracing_subscriber::EnvFilter;

const LOG_FORMAT_VAR: &str = "LOG_FORMAT";

pub(crate) fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if wants_json(std::env::var(LOG_FORMAT_VAR).ok().as_deref()) {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn wants_json(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.trim().eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::wants_json;

    #[test]
    fn json_format_is_opt_in() {
        assert!(wants_json(Some("json")));
        assert!(wants_json(Some(" JSON ")));
        assert!(!wants_json(Some("text")));
        assert!(!wants_json(None));
    }
}
