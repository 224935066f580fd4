use std::path::PathBuf;

use clap::builder::NonEmptyStringValueParser;
use clap::Parser;

/// Restart the NAME container from STATEFILE
#[derive(Parser, Debug)]
pub struct Restart {
    /// NAME of the container
    #[clap(short, long, value_parser = NonEmptyStringValueParser::new(), required = true)]
    pub name: String,
    /// STATEFILE the container is restored from
    #[clap(short = 'd', long = "directory", value_name = "STATEFILE")]
    pub statefile: Option<PathBuf>,
    /// Load configuration file FILE
    #[clap(short = 'f', long, value_name = "FILE")]
    pub rcfile: Option<PathBuf>,
    /// Do not release the container after the restart
    #[clap(short, long)]
    pub pause: bool,
}

// Options shared by the lxc tools
#[derive(Parser, Debug)]
pub struct GlobalOpts {
    /// Output log to FILE instead of stderr
    #[clap(short = 'o', long, value_name = "FILE")]
    pub logfile: Option<PathBuf>,
    /// Set log priority to LEVEL (trace, debug, info, notice, warn, error, crit, alert, fatal)
    #[clap(short = 'l', long, value_name = "LEVEL")]
    pub logpriority: Option<String>,
    /// Don't produce any output on stderr
    #[clap(short, long)]
    pub quiet: bool,
    /// Set the log format ('text' (default), or 'json')
    #[clap(long)]
    pub log_format: Option<String>,
    /// Directory holding the container directories
    #[clap(short = 'P', long, value_name = "PATH", default_value = "/var/lib/lxc")]
    pub lxcpath: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser, Debug)]
    struct Opts {
        #[clap(flatten)]
        global: GlobalOpts,
        #[clap(flatten)]
        restart: Restart,
    }

    #[test]
    fn test_parse_short_options() {
        let opts = Opts::try_parse_from([
            "lxc-restart",
            "-n",
            "web2",
            "-d",
            "/tmp/x.img",
            "-f",
            "/etc/lxc/web2.conf",
            "-p",
            "-o",
            "/tmp/lxc.log",
            "-l",
            "DEBUG",
            "-q",
        ])
        .unwrap();

        assert_eq!(opts.restart.name, "web2");
        assert_eq!(opts.restart.statefile, Some(PathBuf::from("/tmp/x.img")));
        assert_eq!(
            opts.restart.rcfile,
            Some(PathBuf::from("/etc/lxc/web2.conf"))
        );
        assert!(opts.restart.pause);
        assert_eq!(opts.global.logfile, Some(PathBuf::from("/tmp/lxc.log")));
        assert_eq!(opts.global.logpriority.as_deref(), Some("DEBUG"));
        assert!(opts.global.quiet);
        assert_eq!(opts.global.lxcpath, PathBuf::from("/var/lib/lxc"));
    }

    #[test]
    fn test_parse_long_options() {
        let opts = Opts::try_parse_from([
            "lxc-restart",
            "--name=web1",
            "--directory=/var/lib/lxc-state/web1.img",
            "--lxcpath=/srv/lxc",
            "--log-format=json",
        ])
        .unwrap();

        assert_eq!(opts.restart.name, "web1");
        assert_eq!(
            opts.restart.statefile,
            Some(PathBuf::from("/var/lib/lxc-state/web1.img"))
        );
        assert!(opts.restart.rcfile.is_none());
        assert!(!opts.restart.pause);
        assert!(!opts.global.quiet);
        assert_eq!(opts.global.log_format.as_deref(), Some("json"));
        assert_eq!(opts.global.lxcpath, PathBuf::from("/srv/lxc"));
    }

    #[test]
    fn test_statefile_is_optional_at_parse_time() {
        let opts = Opts::try_parse_from(["lxc-restart", "-n", "web1"]).unwrap();
        assert!(opts.restart.statefile.is_none());
    }

    #[test]
    fn test_name_is_required_and_non_empty() {
        assert!(Opts::try_parse_from(["lxc-restart", "-d", "/tmp/x.img"]).is_err());
        assert!(Opts::try_parse_from(["lxc-restart", "-n", "", "-d", "/tmp/x.img"]).is_err());
    }
}
