use std::io::Write;

use snafu::ResultExt;

use crate::{
    cli::{Error, error},
    config::Config,
};

/// Builds the catalog and converts every injector selector, reporting the
/// first problem found.
pub fn run(config: &Config) -> Result<(), Error> {
    let catalog = config.catalog()?;
    catalog.check_selectors()?;

    let (containers, volumes, injectors) = catalog.summary();
    writeln!(
        std::io::stdout(),
        "Configuration is valid: {containers} container(s), {volumes} volume(s), {injectors} \
         injector(s)"
    )
    .context(error::WriteStdoutSnafu)
}
