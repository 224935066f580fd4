//! Contains functionality of the restart command
use std::path::PathBuf;

use anyhow::Result;
use liblxc::config::{ConfigLoader, FileConfigLoader};
use liblxc::engine::{CriuEngine, RestoreEngine};
use liblxc::restart::{Restart as RestartFlow, RestartArgs};
use liblxc_cli::Restart;

pub fn restart(args: Restart, lxcpath: PathBuf) -> Result<()> {
    tracing::debug!("start restarting container {}", args.name);
    let args = restart_args(args, lxcpath);
    run(&args, &FileConfigLoader, &CriuEngine::new())
}

fn restart_args(args: Restart, lxcpath: PathBuf) -> RestartArgs {
    RestartArgs {
        name: args.name,
        statefile: args.statefile,
        rcfile: args.rcfile,
        pause: args.pause,
        lxcpath,
    }
}

fn run(args: &RestartArgs, loader: &dyn ConfigLoader, engine: &dyn RestoreEngine) -> Result<()> {
    RestartFlow::new(loader, engine).run(args)?;
    tracing::debug!("container {} restarted", args.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use liblxc::config::test::TestConfigLoader;
    use liblxc::engine::test::TestRestoreEngine;
    use liblxc::engine::RestartFlags;
    use liblxc::restart::RestartError;

    use super::*;

    fn cli(name: &str, statefile: Option<&str>, pause: bool) -> Restart {
        Restart {
            name: name.to_owned(),
            statefile: statefile.map(PathBuf::from),
            rcfile: None,
            pause,
        }
    }

    #[test]
    fn test_missing_statefile() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let err = restart(cli("web1", None, false), tmp.path().to_path_buf()).unwrap_err();
        assert_eq!(err.to_string(), "no statefile specified");
        assert!(matches!(
            err.downcast_ref::<RestartError>(),
            Some(RestartError::MissingRequiredArgument { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_pause_reaches_engine() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let args = restart_args(cli("web2", Some("/tmp/x.img"), true), tmp.path().to_path_buf());
        let loader = TestConfigLoader::new();
        let engine = TestRestoreEngine::new();

        run(&args, &loader, &engine)?;

        let calls = engine.get_restore_args();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].flags, RestartFlags::PAUSE);
        assert!(calls[0].conf.is_empty());
        Ok(())
    }

    #[test]
    fn test_default_config_is_loaded() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        fs::create_dir(tmp.path().join("web1"))?;
        fs::write(tmp.path().join("web1/config"), "lxc.utsname = web1\n")?;
        let args = restart_args(
            cli("web1", Some("/var/lib/lxc-state/web1.img"), false),
            tmp.path().to_path_buf(),
        );
        let loader = TestConfigLoader::new();
        let engine = TestRestoreEngine::new();

        run(&args, &loader, &engine)?;

        assert_eq!(loader.get_load_args(), vec![tmp.path().join("web1/config")]);
        let calls = engine.get_restore_args();
        assert_eq!(calls[0].conf.utsname.as_deref(), Some("web1"));
        assert_eq!(calls[0].flags, RestartFlags::empty());
        Ok(())
    }
}
