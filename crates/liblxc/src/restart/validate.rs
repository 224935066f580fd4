use std::path::Path;

use super::{RestartArgs, RestartError, Result};

/// Checks the arguments needed before any other work is attempted and
/// returns the state file to restore from.
pub fn validate(args: &RestartArgs) -> Result<&Path> {
    match args.statefile.as_deref() {
        Some(statefile) if !statefile.as_os_str().is_empty() => Ok(statefile),
        _ => Err(RestartError::MissingRequiredArgument { field: "statefile" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let args = RestartArgs::new("web1").with_statefile("/var/lib/lxc-state/web1.img");
        assert_eq!(
            validate(&args).unwrap(),
            Path::new("/var/lib/lxc-state/web1.img")
        );

        let args = RestartArgs::new("web1");
        assert!(matches!(
            validate(&args),
            Err(RestartError::MissingRequiredArgument { field: "statefile" })
        ));

        let args = RestartArgs::new("web1").with_statefile("");
        assert!(matches!(
            validate(&args),
            Err(RestartError::MissingRequiredArgument { .. })
        ));
    }

    #[test]
    fn test_validate_ignores_other_fields() {
        // name, rcfile and lxcpath are not checked here
        let args = RestartArgs::new("")
            .with_statefile("x.img")
            .with_rcfile("")
            .with_lxcpath("");
        assert!(validate(&args).is_ok());
    }
}
