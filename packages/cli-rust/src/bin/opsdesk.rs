//! `opsdesk` binary

use console::style;

fn main() {
    if let Err(e) = opsdesk::run() {
        eprintln!("{} {e:#}", style("Error:").red().bold());
        std::process::exit(1);
    }
}
