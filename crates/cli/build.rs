use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("mdscraper")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert the main content of web pages to Markdown")
        .arg(clap::arg!(--url <URL> "URL of a single page to fetch and convert"))
        .arg(
            clap::arg!(--file <FILE> "Text file with one URL per line")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--site <URL> "Seed page whose same-site links are fetched and converted"))
        .arg(clap::arg!(--html <PATH> "Local HTML file to convert, or '-' for stdin"))
        .arg(clap::arg!(--"source-url" <URL> "URL the --html input was saved from"))
        .arg(clap::arg!(-o --output <NAME> "Output filename: %TITLE, %URL, a fixed name, or '-' for stdout"))
        .arg(
            clap::arg!(--outdir <DIR> "Directory for output files")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(-r --"root-url" <URL> "Root URL; links below it become relative Markdown links"))
        .arg(clap::arg!(-c --content <HINT> ... "Tag, class, id or CSS selector of the content container"))
        .arg(clap::arg!(--"content-type" <TAG> "Tag to prefer when matching content hints"))
        .arg(clap::arg!(-i --"no-images" "Remove every image"))
        .arg(clap::arg!(--"no-links" "Replace every link by its text"))
        .arg(clap::arg!(--"prepend-source-link" "Start the output with a 'Source: <url>' line"))
        .arg(clap::arg!(--"title-heading" "Start the output with the page title as a heading"))
        .arg(clap::arg!(-p --"exclude-pages" <PATTERN> ... "Glob patterns of page names skipped in site mode"))
        .arg(clap::arg!(-s --"exclude-selectors" <SELECTOR> ... "CSS selectors removed from the content"))
        .arg(clap::arg!(--"extra-heading-space" <LEVELS> "Heading levels that get an extra blank line"))
        .arg(clap::arg!(-j --jobs <N> "Pages converted concurrently"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests"))
        .arg(
            clap::arg!(--settings <FILE> "YAML or JSON settings file; flags take precedence")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"save-settings" "Save the merged settings to the output directory and exit"))
        .arg(clap::arg!(-d --debug "Log locator decisions and the content before cleaning"))
        .arg(clap::arg!(-v --verbose ... "Print progress (-v) and a preview of each page (-vv)"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "mdscraper", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "mdscraper", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "mdscraper", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "mdscraper", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
