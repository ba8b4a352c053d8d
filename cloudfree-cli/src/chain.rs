//! Command chaining.
//!
//! `cloudfree search ... composite ... download ...` is split into one
//! argument segment per command. Each segment is parsed on its own and the
//! commands run in order against a shared pipeline context.

/// Commands that start a new segment.
pub const CHAINABLE: &[&str] = &["search", "composite", "download", "export"];

/// Command that takes the rest of the arguments and cannot be chained.
pub const STANDALONE: &str = "config";

/// Split arguments (without the program name) at command names.
///
/// Arguments before the first command form their own segment, so global
/// flags such as `--help` still reach the parser. Everything after
/// `config` stays in the config segment.
pub fn split_chain(args: &[String]) -> Vec<Vec<String>> {
    let mut segments: Vec<Vec<String>> = Vec::new();
    let mut standalone = false;

    for arg in args {
        let starts_command = !standalone
            && (CHAINABLE.contains(&arg.as_str()) || arg == STANDALONE);
        if starts_command {
            standalone = arg == STANDALONE;
            segments.push(Vec::new());
        } else if segments.is_empty() {
            segments.push(Vec::new());
        }
        if let Some(segment) = segments.last_mut() {
            segment.push(arg.clone());
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_single_command() {
        assert_eq!(
            split_chain(&args("download -i a/b --bbox 1 2 3 4")),
            vec![args("download -i a/b --bbox 1 2 3 4")]
        );
    }

    #[test]
    fn test_chain() {
        let segments = split_chain(&args(
            "search -s 2021-01-01 -b 20 -34 21 -33 composite --method median download -o",
        ));
        assert_eq!(
            segments,
            vec![
                args("search -s 2021-01-01 -b 20 -34 21 -33"),
                args("composite --method median"),
                args("download -o"),
            ]
        );
    }

    #[test]
    fn test_leading_flags() {
        assert_eq!(split_chain(&args("--version")), vec![args("--version")]);
        assert!(split_chain(&[]).is_empty());
    }

    #[test]
    fn test_config_takes_rest() {
        assert_eq!(
            split_chain(&args("config set download.directory search")),
            vec![args("config set download.directory search")]
        );
    }
}
