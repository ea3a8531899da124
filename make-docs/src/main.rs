//! Regenerate the `src/scripts.rs` documentation from each check's `--help`
//!
//! Run from the repository root after `cargo build`:
//!
//! ```plain
//! cargo run -p make-docs > src/scripts.rs
//! ```

use std::process::{self, Command};

struct Check {
    name: &'static str,
    about: &'static str,
}

const CHECKS: [Check; 4] = [
    Check {
        name: "check-facedetect",
        about: "Cross platform, only requires access to the service's HTTP port.",
    },
    Check {
        name: "check-redis",
        about: "Cross platform, only requires access to the redis port.",
    },
    Check {
        name: "check-supervisord",
        about: "Cross platform, requires supervisord's `[inet_http_server]` to be enabled.",
    },
    Check {
        name: "check-uptime",
        about: "Linux-only, unless `--stdin` is used.",
    },
];

fn main() {
    let preamble = "Documentation about the various scripts contained herein\n";
    let contract = "Every script prints exactly one line, `STATUS: message|perfdata`, and
exits 0, 1, 2 or 3 for OK, WARNING, CRITICAL or UNKNOWN. Set `RUST_LOG=debug`
to see what a script is doing on stderr.";

    let mut out: String = cp(preamble.split('\n'));
    out.push_str("\n");
    out.push_str(&cp(CHECKS.iter().map(|c| format!("- [{0}](#{0})", c.name))));
    out.push_str("\n//!\n");
    out.push_str(&cp(contract.split('\n')));
    out.push_str("\n");
    for check in &CHECKS {
        out.push_str(&format!(
            "\
//!
//! # {0}
//!
//! {1}
//!
//! ```plain
//! $ {0} --help
",
            check.name, check.about
        ));
        let help = match help_text(check.name) {
            Ok(help) => help,
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        };
        out.push_str(&cp(help.trim_end().split('\n')));
        out.push_str("\n//! ```\n");
    }
    print!("{}", out);
}

/// Run a built check with `--help` and capture what it prints
fn help_text(name: &str) -> Result<String, String> {
    let output = Command::new(&format!("target/debug/{}", name))
        .args(&["--help"])
        .output()
        .map_err(|e| format!("Couldn't execute command {}: {}", name, e))?;
    String::from_utf8(output.stdout)
        .map_err(|e| format!("Couldn't convert command {} help to utf8: {}", name, e))
}

/// Comment each line in the iterator
fn cp<S: AsRef<str>, I: Iterator<Item = S>>(s: I) -> String {
    s.map(|s| format!("//! {}", s.as_ref()))
        .map(|s| s.trim().into())
        .collect::<Vec<String>>()
        .join("\n")
}
