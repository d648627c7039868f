use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");

    let package = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let version = match Command::new("git").args(["rev-parse", "--short", "HEAD"]).output() {
        Ok(output) if output.status.success() => {
            let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if sha.is_empty() {
                package
            } else {
                format!("{package} ({sha})")
            }
        }
        _ => package,
    };
    println!("cargo:rustc-env=TM2BD_BUILD_VERSION={version}");
}
