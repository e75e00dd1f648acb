//! Transform backend running GraphicsMagick's `gm` command.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use which;

use super::{RasterTransform, Transform, TransformError};


const PROGRAM: &str = "gm";


/// Transform backend that invokes `gm convert` as a subprocess.
#[derive(Clone, Debug)]
pub struct GraphicsMagick {
    program: PathBuf,
}

impl GraphicsMagick {
    /// Use the `gm` program found on the `PATH`.
    pub fn locate() -> Result<Self, TransformError> {
        let program = which::which(PROGRAM)
            .map_err(|_| TransformError::NotFound(PROGRAM.to_owned()))?;
        debug!("Using GraphicsMagick program at {}", program.display());
        Ok(GraphicsMagick{program})
    }

    /// Use the `gm` program at given path.
    pub fn with_program<P: AsRef<Path>>(program: P) -> Result<Self, TransformError> {
        let program = program.as_ref();
        let program = which::which(program)
            .map_err(|_| TransformError::NotFound(format!("{}", program.display())))?;
        Ok(GraphicsMagick{program})
    }

    #[inline]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl GraphicsMagick {
    /// Command line arguments of `gm` for given transform.
    pub fn args(transform: Transform, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["convert".into()];
        match transform {
            Transform::Blur(amount) => {
                args.push("-blur".into());
                args.push(amount.to_string().into());
            }
            Transform::Resize(scale) => {
                args.push("-resize".into());
                args.push(format!("{}%", scale * 100.0).into());
            }
            Transform::Rotate(angle) => {
                args.push("-rotate".into());
                args.push(angle.to_string().into());
            }
            Transform::Convert => {}
        }
        args.push(input.as_os_str().to_owned());
        args.push(output.as_os_str().to_owned());
        args
    }
}

impl RasterTransform for GraphicsMagick {
    fn name(&self) -> &str {
        "gm"
    }

    fn apply(&self, transform: Transform, input: &Path, output: &Path) -> Result<(), TransformError> {
        let args = Self::args(transform, input, output);
        debug!("Running {} {:?}", self.program.display(), args);

        let start = Instant::now();
        let result = Command::new(&self.program).args(&args).output()
            .map_err(|e| TransformError::Spawn(self.program.clone(), e))?;
        let elapsed = start.elapsed();

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_owned();
            error!("{} for {} failed after {:?} with {}: {}",
                PROGRAM, transform, elapsed, result.status, stderr);
            return Err(TransformError::Command{status: result.status, stderr});
        }
        debug!("{} for {} finished in {:?}", PROGRAM, transform, elapsed);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::path::Path;
    use super::GraphicsMagick;
    use super::super::Transform;

    fn args(transform: Transform) -> Vec<OsString> {
        GraphicsMagick::args(transform, Path::new("in.png"), Path::new("out_in.png"))
    }

    #[test]
    fn command_lines() {
        assert_eq!(args(Transform::Blur(2.5)),
            vec!["convert", "-blur", "2.5", "in.png", "out_in.png"]);
        assert_eq!(args(Transform::Resize(0.5)),
            vec!["convert", "-resize", "50%", "in.png", "out_in.png"]);
        assert_eq!(args(Transform::Rotate(90.0)),
            vec!["convert", "-rotate", "90", "in.png", "out_in.png"]);
        assert_eq!(args(Transform::Convert),
            vec!["convert", "in.png", "out_in.png"]);
    }

    #[test]
    fn missing_program() {
        assert!(GraphicsMagick::with_program("/nonexistent/gm").is_err());
    }
}
