use crate::library::LibraryConfig;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaunchOptions {
    pub config: LibraryConfig,
    pub initial_id: Option<u32>,
}

pub fn parse_launch_options_from_args(args: &[String]) -> Result<LaunchOptions, String> {
    let mut options = LaunchOptions::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let (flag, inline_value) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (arg.as_str(), None),
        };
        let mut value = || {
            inline_value
                .clone()
                .or_else(|| iter.next().cloned())
                .ok_or_else(|| format!("Missing value after {flag}."))
        };

        match flag {
            "--id" => {
                let raw = value()?;
                options.initial_id = Some(parse_item_id(&raw, &options.config)?);
            }
            "--item-base" => options.config.item_base = parse_base_url(flag, &value()?)?,
            "--photo-base" => options.config.photo_base = parse_base_url(flag, &value()?)?,
            other => return Err(format!("Unrecognized argument: {other}")),
        }
    }

    Ok(options)
}

fn parse_item_id(raw: &str, config: &LibraryConfig) -> Result<u32, String> {
    let id = raw
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("Item ID must be a non-negative integer (got {raw:?})."))?;
    if !config.id_range.contains(&id) {
        return Err(format!(
            "Item ID {id} is outside {}..={}.",
            config.id_range.start(),
            config.id_range.end()
        ));
    }
    Ok(id)
}

fn parse_base_url(flag: &str, raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(format!("{flag} must be an http(s) URL (got {raw:?})."));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn no_args_uses_defaults() {
        let options = parse_launch_options_from_args(&[]).expect("should parse");
        assert_eq!(options, LaunchOptions::default());
    }

    #[test]
    fn parse_initial_id_and_mirror() {
        let options = parse_launch_options_from_args(&args(&[
            "--id",
            "42",
            "--item-base=http://localhost:8080/id/",
        ]))
        .expect("should parse");
        assert_eq!(options.initial_id, Some(42));
        assert_eq!(options.config.item_url(42), "http://localhost:8080/id/42");
        assert_eq!(options.config.photo_base, LibraryConfig::default().photo_base);
    }

    #[test]
    fn id_outside_catalog_range_is_rejected() {
        let err = parse_launch_options_from_args(&args(&["--id", "26224"])).unwrap_err();
        assert!(err.contains("26224"));
        assert!(parse_launch_options_from_args(&args(&["--id", "26223"])).is_ok());
        assert!(parse_launch_options_from_args(&args(&["--id", "-1"])).is_err());
    }

    #[test]
    fn missing_value_and_unknown_flag_are_errors() {
        assert_eq!(
            parse_launch_options_from_args(&args(&["--photo-base"])).unwrap_err(),
            "Missing value after --photo-base."
        );
        assert!(parse_launch_options_from_args(&args(&["--verbose"])).is_err());
        assert!(parse_launch_options_from_args(&args(&["--item-base", "ftp://x/"])).is_err());
    }
}
