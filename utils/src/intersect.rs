use std::{
    ffi::OsString,
    io::BufReader,
    path::Path,
    process::{Child, ChildStdout, Command, Stdio},
};

use anyhow::Context;

/// One invocation of the external intersectBed binary (bedtools).  The tool
/// is only ever consumed as a line stream on stdout; interval intersection
/// itself is never reimplemented here.
pub struct IntersectBed {
    args: Vec<OsString>,
}

impl IntersectBed {
    /// intersectBed -wo -a <a> -b <b>
    pub fn features<P: AsRef<Path>, Q: AsRef<Path>>(a: P, b: Q) -> Self {
        let mut args: Vec<OsString> = vec!["-wo".into(), "-a".into()];
        args.push(a.as_ref().as_os_str().to_os_string());
        args.push("-b".into());
        args.push(b.as_ref().as_os_str().to_os_string());
        Self { args }
    }

    /// intersectBed -split -wo -bed -abam <bam> -b <b>
    pub fn bam_features<P: AsRef<Path>, Q: AsRef<Path>>(bam: P, b: Q) -> Self {
        let mut args: Vec<OsString> = vec!["-split".into(), "-wo".into(), "-bed".into()];
        args.push("-abam".into());
        args.push(bam.as_ref().as_os_str().to_os_string());
        args.push("-b".into());
        args.push(b.as_ref().as_os_str().to_os_string());
        Self { args }
    }

    pub fn spawn(self) -> anyhow::Result<Intersection> {
        debug!("Spawning intersectBed with args {:?}", self.args);
        let mut child = Command::new("intersectBed")
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| "Could not run intersectBed - is bedtools installed and on PATH?")?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("No stdout handle for intersectBed child"))?;
        Ok(Intersection {
            child: Some(child),
            rdr: BufReader::new(stdout),
        })
    }
}

/// A running intersectBed child.  Dropping the handle without calling
/// finish() kills the child so a failed run does not leave it behind.
pub struct Intersection {
    child: Option<Child>,
    rdr: BufReader<ChildStdout>,
}

impl Intersection {
    pub fn reader(&mut self) -> &mut BufReader<ChildStdout> {
        &mut self.rdr
    }

    /// Wait for the child to terminate.  Fails on a non-zero exit status.
    pub fn finish(&mut self) -> anyhow::Result<()> {
        if let Some(mut child) = self.child.take() {
            let status = child
                .wait()
                .with_context(|| "Error waiting for intersectBed")?;
            if !status.success() {
                return Err(anyhow!("intersectBed exited with status {}", status));
            }
        }
        Ok(())
    }
}

impl Drop for Intersection {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_args() {
        let ix = IntersectBed::features("genes.gtf", "repeats.gff");
        let v: Vec<_> = ix.args.iter().map(|s| s.to_string_lossy()).collect();
        assert_eq!(v, ["-wo", "-a", "genes.gtf", "-b", "repeats.gff"]);
    }

    #[test]
    fn bam_features_args() {
        let ix = IntersectBed::bam_features("reads.bam", "peaks.gff");
        let v: Vec<_> = ix.args.iter().map(|s| s.to_string_lossy()).collect();
        assert_eq!(
            v,
            ["-split", "-wo", "-bed", "-abam", "reads.bam", "-b", "peaks.gff"]
        );
    }
}
