use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("readmark")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Readmark Contributors")
        .about("Extract the main content of HTML documents as Markdown")
        .arg(clap::arg!([INPUT] "Local HTML file, or '-' for stdin").default_value("-"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (markdown, json)")
                .value_name("FORMAT")
                .default_value("markdown")
                .value_parser(["markdown", "md", "json"]),
        )
        .arg(clap::arg!(-u --"source-url" <URL> "URL the document was served from (default: the input path)"))
        .arg(
            clap::arg!(--config <FILE> "TOML file with extraction settings")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"max-depth" <NUM> "Maximum element nesting depth before subtrees are flattened"))
        .arg(clap::arg!(--frontmatter "Include TOML frontmatter (Markdown) or the source field (JSON)"))
        .arg(clap::arg!(--references "Include reference table with all links"))
        .arg(clap::arg!(--"no-images" "Strip images from output"))
        .arg(clap::arg!(--"no-links" "Render links as plain text"))
        .arg(clap::arg!(--strict "Fail when the input exceeds a resource limit"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    for shell in [
        clap_complete::Shell::Bash,
        clap_complete::Shell::Zsh,
        clap_complete::Shell::Fish,
        clap_complete::Shell::PowerShell,
    ] {
        clap_complete::generate_to(shell, &mut cmd, "readmark", &completions_dir).unwrap();
    }

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}
