//! Le build script.

use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;


/// File in the $OUT_DIR where the current revision is written.
const REVISION_FILE: &str = "revision";


fn main() {
    // The SHA cannot be passed as an env!() variable to the crate code,
    // so it goes to a file for include_str!() instead.
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set by Cargo");
    let rev_path = Path::new(&out_dir).join(REVISION_FILE);

    let revision = git_head_sha().unwrap_or_else(|e| {
        println!("cargo:warning=Failed to obtain current Git SHA: {}", e);
        String::new()
    });
    fs::write(&rev_path, revision).expect("cannot write revision file");
}

fn git_head_sha() -> io::Result<String> {
    let output = Command::new("git")
        .args(&["rev-parse", "--short", "HEAD"])
        .output()?;
    if !output.status.success() {
        return Err(io::Error::new(io::ErrorKind::Other, "not a Git repository"));
    }
    let sha = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    Ok(sha)
}
