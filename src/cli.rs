use anyhow::{Result, bail};

pub const USAGE: &str = "\
Usage: vagas-tui [COMMAND]

Terminal browser for the frontendbr/vagas issue board.

Commands:
  labels      Print the repository labels and exit
  -h, --help  Print this help
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliCommand {
    Labels,
    Help,
}

pub fn parse_args(args: &[String]) -> Result<Option<CliCommand>> {
    if args.len() <= 1 {
        return Ok(None);
    }
    if args.len() > 2 {
        bail!("too many arguments\n\n{}", USAGE);
    }

    match args.get(1).map(String::as_str) {
        Some("labels") => Ok(Some(CliCommand::Labels)),
        Some("-h") | Some("--help") => Ok(Some(CliCommand::Help)),
        Some(other) => bail!("unknown argument '{}'\n\n{}", other, USAGE),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::{CliCommand, parse_args};

    #[test]
    fn parse_args_returns_none_for_empty() {
        let args = vec!["vagas-tui".to_string()];
        let parsed = parse_args(&args).expect("parse succeeds");
        assert_eq!(parsed, None);
    }

    #[test]
    fn parse_args_returns_labels() {
        let args = vec!["vagas-tui".to_string(), "labels".to_string()];
        let parsed = parse_args(&args).expect("parse succeeds");
        assert_eq!(parsed, Some(CliCommand::Labels));
    }

    #[test]
    fn parse_args_returns_help_for_both_flags() {
        for flag in ["-h", "--help"] {
            let args = vec!["vagas-tui".to_string(), flag.to_string()];
            let parsed = parse_args(&args).expect("parse succeeds");
            assert_eq!(parsed, Some(CliCommand::Help));
        }
    }

    #[test]
    fn parse_args_rejects_unknown_command() {
        let args = vec!["vagas-tui".to_string(), "sync".to_string()];
        let error = parse_args(&args).expect_err("unknown command fails");
        assert!(error.to_string().contains("unknown argument 'sync'"));
    }

    #[test]
    fn parse_args_rejects_extra_arguments() {
        let args = vec![
            "vagas-tui".to_string(),
            "labels".to_string(),
            "extra".to_string(),
        ];
        assert!(parse_args(&args).is_err());
    }
}
