use std::{
    env,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::Context;

/// Plotting script expected under $RDIR
const PLOT_SCRIPT: &str = "expr_heat.r";

/// Render the heatmap by handing the long format table to the external
/// plotting script
pub fn render(table: &Path, out_pdf: &Path) -> anyhow::Result<()> {
    let rdir = env::var_os("RDIR")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("RDIR environment variable is not set"))?;
    let script = rdir.join(PLOT_SCRIPT);

    debug!(
        "Rendering {} via {}",
        out_pdf.display(),
        script.display()
    );
    let status = Command::new("Rscript")
        .arg(&script)
        .arg(table)
        .arg(out_pdf)
        .status()
        .with_context(|| "Could not run Rscript - is R installed and on PATH?")?;
    if !status.success() {
        Err(anyhow!(
            "Rscript exited with status {} while rendering {}",
            status,
            out_pdf.display()
        ))
    } else {
        Ok(())
    }
}
