use std::fs;
use std::path::Path;

use clap::CommandFactory;

// cli.rs only depends on clap, so the build script can include it directly.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let Some(out_dir) = std::env::var_os("OUT_DIR") else {
        panic!("OUT_DIR not set by Cargo");
    };
    let man_dir = Path::new(&out_dir).join("man");
    if let Err(e) = fs::create_dir_all(&man_dir) {
        panic!("failed to create {}: {e}", man_dir.display());
    }

    // dahua.1 plus one page per subcommand (dahua-watch.1, ...).
    let root = cli::Cli::command();
    write_page(&root, &man_dir);
    for sub in root.get_subcommands().filter(|s| !s.is_hide_set()) {
        let named = sub.clone().name(format!("dahua-{}", sub.get_name()));
        write_page(&named, &man_dir);
    }
}

fn write_page(cmd: &clap::Command, dir: &Path) {
    let path = dir.join(format!("{}.1", cmd.get_name()));
    let mut buf = Vec::new();
    if let Err(e) = clap_mangen::Man::new(cmd.clone()).render(&mut buf) {
        panic!("failed to render {}: {e}", path.display());
    }
    if let Err(e) = fs::write(&path, buf) {
        panic!("failed to write {}: {e}", path.display());
    }
}
